use log::{debug, error, warn};
use std::cell::{Cell, RefCell};
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

use crate::codec::{FrameCodec, MAX_FRAME_LEN};
use crate::transport::RfidTransport;
use crate::types::{ChannelState, Command, ReaderError, Result};

const READ_CHUNK_SIZE: usize = 256;

/// Sleep between reads when the transport reports no data yet
const IDLE_POLL: Duration = Duration::from_millis(5);

/// How a tag read is started on the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadTrigger {
    /// Send this command, then wait for its response frame
    Command(Command),
    /// Send nothing and wait for the next frame the device pushes
    Passive,
}

impl Default for ReadTrigger {
    fn default() -> Self {
        ReadTrigger::Command(Command::read())
    }
}

/// Protocol limits and device parameters for a [`CommandChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Largest response frame accepted, terminator included
    pub max_frame_len: usize,
    /// Transmit power the device accepts, in dBm
    pub power_range: RangeInclusive<i32>,
    pub read_trigger: ReadTrigger,
    /// Timeout used by [`CommandChannel::send`]
    pub default_timeout: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_frame_len: MAX_FRAME_LEN,
            power_range: -10..=33,
            read_trigger: ReadTrigger::default(),
            default_timeout: Duration::from_secs(2),
        }
    }
}

impl ChannelConfig {
    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    pub fn with_power_range(mut self, power_range: RangeInclusive<i32>) -> Self {
        self.power_range = power_range;
        self
    }

    pub fn with_read_trigger(mut self, read_trigger: ReadTrigger) -> Self {
        self.read_trigger = read_trigger;
        self
    }

    pub fn with_default_timeout(mut self, default_timeout: Duration) -> Self {
        self.default_timeout = default_timeout;
        self
    }
}

/// Request/response protocol over an [`RfidTransport`].
///
/// One command is in flight at a time. Each call writes one command frame and
/// reads back exactly one response frame, bounded by a timeout and by the
/// configured frame limit. Any I/O failure leaves the channel
/// [`Faulted`](ChannelState::Faulted) until the transport is reopened.
///
/// Methods take `&self` so a call made while another is still outstanding
/// (for example from a transport callback) is detected and rejected with
/// [`ReaderError::ChannelBusy`] instead of interleaving on the wire.
pub struct CommandChannel<T: RfidTransport> {
    transport: RefCell<T>,
    state: Cell<ChannelState>,
    /// Bytes read past the last terminator, start of the next frame
    pending: RefCell<Vec<u8>>,
    codec: FrameCodec,
    config: ChannelConfig,
}

impl<T: RfidTransport> CommandChannel<T> {
    /// Create a channel with the default configuration
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ChannelConfig::default())
    }

    pub fn with_config(transport: T, config: ChannelConfig) -> Self {
        Self {
            transport: RefCell::new(transport),
            state: Cell::new(ChannelState::Idle),
            pending: RefCell::new(Vec::new()),
            codec: FrameCodec::new(config.max_frame_len),
            config,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state.get()
    }

    pub fn is_faulted(&self) -> bool {
        self.state.get() == ChannelState::Faulted
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    pub fn codec(&self) -> &FrameCodec {
        &self.codec
    }

    /// Consume the channel and return the transport.
    pub fn into_inner(self) -> T {
        self.transport.into_inner()
    }

    /// Read a tag using the configured [`ReadTrigger`].
    pub fn read_tag(&self, timeout: Duration) -> Result<String> {
        match &self.config.read_trigger {
            ReadTrigger::Command(trigger) => self.send_command(trigger, timeout),
            ReadTrigger::Passive => self.await_response(timeout),
        }
    }

    /// Set transmit power. Returns the device's acknowledgement uninterpreted.
    pub fn set_power_level(&self, dbm: i32, timeout: Duration) -> Result<String> {
        let range = &self.config.power_range;
        if !range.contains(&dbm) {
            return Err(ReaderError::OutOfRange {
                name: "transmit power (dBm)",
                value: dbm.into(),
                min: (*range.start()).into(),
                max: (*range.end()).into(),
            });
        }

        self.send_command(&Command::set_power(dbm), timeout)
    }

    /// Set the device polling interval. Returns the acknowledgement uninterpreted.
    pub fn set_ping_rate(&self, milliseconds: i64, timeout: Duration) -> Result<String> {
        let milliseconds = u32::try_from(milliseconds)
            .ok()
            .filter(|&ms| ms > 0)
            .ok_or(ReaderError::OutOfRange {
                name: "ping rate (ms)",
                value: milliseconds,
                min: 1,
                max: u32::MAX.into(),
            })?;

        self.send_command(&Command::set_ping(milliseconds), timeout)
    }

    /// [`send_command`](Self::send_command) with the configured default timeout
    pub fn send(&self, command: &Command) -> Result<String> {
        self.send_command(command, self.config.default_timeout)
    }

    /// Write `command` and wait up to `timeout` for its response frame.
    pub fn send_command(&self, command: &Command, timeout: Duration) -> Result<String> {
        self.begin(ChannelState::Sending)?;
        let frame = self.codec.encode(command);
        let result = self.transact(Some(frame.as_slice()), timeout);
        self.finish(result)
    }

    /// Wait for one frame without sending anything first.
    ///
    /// Used for devices that push reads unsolicited. Follows the same timeout,
    /// limit and fault rules as [`send_command`](Self::send_command).
    pub fn await_response(&self, timeout: Duration) -> Result<String> {
        self.begin(ChannelState::AwaitingResponse)?;
        let result = self.transact(None, timeout);
        self.finish(result)
    }

    fn begin(&self, next: ChannelState) -> Result<()> {
        match self.state.get() {
            ChannelState::Idle => {
                self.state.set(next);
                Ok(())
            }
            ChannelState::Sending | ChannelState::AwaitingResponse => {
                warn!("Rejecting command: another command is in flight");
                Err(ReaderError::ChannelBusy)
            }
            ChannelState::Faulted => Err(ReaderError::Faulted),
        }
    }

    fn finish(&self, result: Result<String>) -> Result<String> {
        match &result {
            Err(e) if e.faults_channel() => {
                error!("Channel faulted: {}", e);
                self.pending.borrow_mut().clear();
                self.state.set(ChannelState::Faulted);
            }
            _ => self.state.set(ChannelState::Idle),
        }
        result
    }

    fn transact(&self, frame: Option<&[u8]>, timeout: Duration) -> Result<String> {
        let mut transport = self
            .transport
            .try_borrow_mut()
            .map_err(|_| ReaderError::ChannelBusy)?;

        if let Some(frame) = frame {
            let stale = std::mem::take(&mut *self.pending.borrow_mut());
            if !stale.is_empty() {
                warn!("Discarding {} unread bytes before sending command", stale.len());
            }
            transport
                .clear_input()
                .map_err(|e| ReaderError::Transport(format!("{:?}", e)))?;
            debug!("Sending command: {:?}", String::from_utf8_lossy(frame));
            let written = transport
                .write(frame)
                .map_err(|e| ReaderError::Write(format!("{:?}", e)))?;
            if written != frame.len() {
                return Err(ReaderError::Write(format!(
                    "short write: {} of {} bytes",
                    written,
                    frame.len()
                )));
            }
            self.state.set(ChannelState::AwaitingResponse);
        }

        self.read_frame(&mut *transport, timeout)
    }

    fn read_frame(&self, transport: &mut T, timeout: Duration) -> Result<String> {
        let limit = self.codec.max_frame_len();
        let start = Instant::now();
        let mut buffer = std::mem::take(&mut *self.pending.borrow_mut());
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        loop {
            if let Some(end) = self.codec.find_terminator(&buffer) {
                if end >= limit {
                    return Err(ReaderError::FrameTooLong { limit });
                }
                let rest = buffer.split_off(end + 1);
                if !rest.is_empty() {
                    debug!("Keeping {} bytes for the next frame", rest.len());
                    *self.pending.borrow_mut() = rest;
                }
                debug!("Received {} bytes: {:?}", buffer.len(), String::from_utf8_lossy(&buffer));
                return self.codec.decode(&buffer);
            }

            if buffer.len() >= limit {
                return Err(ReaderError::FrameTooLong { limit });
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                warn!(
                    "No response frame within {:?}, discarding {} bytes",
                    timeout,
                    buffer.len()
                );
                return Err(ReaderError::Timeout {
                    elapsed,
                    received: buffer.len(),
                });
            }
            let remaining = timeout - elapsed;

            let want = (limit - buffer.len()).min(chunk.len());
            let bytes_read = transport
                .read(&mut chunk[..want], timeout_ms(remaining))
                .map_err(|e| ReaderError::Transport(format!("{:?}", e)))?;

            if bytes_read == 0 {
                std::thread::sleep(IDLE_POLL.min(remaining));
                continue;
            }

            buffer.extend_from_slice(&chunk[..bytes_read]);
        }
    }
}

fn timeout_ms(remaining: Duration) -> u32 {
    remaining.as_millis().clamp(1, u32::MAX as u128) as u32
}
