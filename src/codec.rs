//! Line framing for the reader's ASCII protocol

use crate::types::{Command, ReaderError, Result};

/// Frame terminator on the wire
pub const TERMINATOR: u8 = b'\n';

/// Largest response frame accepted, terminator included
pub const MAX_FRAME_LEN: usize = 1024;

/// Converts commands to wire bytes and response frames to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCodec {
    max_frame_len: usize,
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(MAX_FRAME_LEN)
    }
}

impl FrameCodec {
    pub fn new(max_frame_len: usize) -> Self {
        Self { max_frame_len }
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    /// Serialize a command as `VERB[ ARG]\n`.
    pub fn encode(&self, command: &Command) -> Vec<u8> {
        let mut frame = command.to_string().into_bytes();
        frame.push(TERMINATOR);
        frame
    }

    /// Decode one response frame into trimmed text.
    ///
    /// The terminator may or may not be included in `raw`.
    pub fn decode(&self, raw: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(raw)?.trim();
        if text.is_empty() {
            return Err(ReaderError::EmptyFrame);
        }
        Ok(text.to_string())
    }

    /// Position of the first terminator in `buf`, if any.
    pub fn find_terminator(&self, buf: &[u8]) -> Option<usize> {
        buf.iter().position(|&b| b == TERMINATOR)
    }
}
