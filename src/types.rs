//! Types for RFID reader operations

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Baud rate used when the caller has no device-specific value.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Command verb understood by the reader
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Trigger a single tag read
    Read,
    /// Set transmit power in dBm
    SetPower,
    /// Set polling interval in milliseconds
    SetPing,
    /// Any other verb the device accepts
    Custom(CustomVerb),
}

/// Device-specific verb text, guaranteed free of whitespace and terminators
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomVerb(String);

impl Verb {
    const READ: &'static str = "READ";
    const SET_POWER: &'static str = "SET_PWR";
    const SET_PING: &'static str = "SET_PING";

    /// Build a verb from its wire text.
    ///
    /// The known verbs map to their variants. Anything else becomes
    /// [`Verb::Custom`] if it is non-empty printable ASCII without spaces.
    pub fn new(text: &str) -> Result<Self, ReaderError> {
        match text {
            Self::READ => Ok(Verb::Read),
            Self::SET_POWER => Ok(Verb::SetPower),
            Self::SET_PING => Ok(Verb::SetPing),
            _ if !text.is_empty() && text.bytes().all(|b| b.is_ascii_graphic()) => {
                Ok(Verb::Custom(CustomVerb(text.to_string())))
            }
            _ => Err(ReaderError::InvalidCommand(format!(
                "verb must be non-empty printable ASCII without whitespace: {:?}",
                text
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Verb::Read => Self::READ,
            Verb::SetPower => Self::SET_POWER,
            Verb::SetPing => Self::SET_PING,
            Verb::Custom(verb) => &verb.0,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single request to the reader: a verb plus an optional integer argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: Verb,
    argument: Option<i64>,
}

impl Command {
    pub fn new(verb: Verb, argument: Option<i64>) -> Self {
        Self { verb, argument }
    }

    pub fn read() -> Self {
        Self::new(Verb::Read, None)
    }

    pub fn set_power(dbm: i32) -> Self {
        Self::new(Verb::SetPower, Some(dbm.into()))
    }

    pub fn set_ping(milliseconds: u32) -> Self {
        Self::new(Verb::SetPing, Some(milliseconds.into()))
    }

    /// Command with a device-specific verb, validated by [`Verb::new`].
    pub fn custom(verb: &str, argument: Option<i64>) -> Result<Self, ReaderError> {
        Ok(Self::new(Verb::new(verb)?, argument))
    }

    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    pub fn argument(&self) -> Option<i64> {
        self.argument
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.argument {
            Some(arg) => write!(f, "{} {}", self.verb, arg),
            None => write!(f, "{}", self.verb),
        }
    }
}

impl FromStr for Command {
    type Err = ReaderError;

    /// Parse the text form of a command, e.g. `"SET_PWR 20"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_ascii_whitespace();
        let verb = match parts.next() {
            Some(verb) => Verb::new(verb)?,
            None => return Err(ReaderError::InvalidCommand("empty command".into())),
        };
        let argument = match parts.next() {
            Some(arg) => Some(arg.parse::<i64>().map_err(|e| {
                ReaderError::InvalidCommand(format!("bad argument {:?}: {}", arg, e))
            })?),
            None => None,
        };
        if let Some(extra) = parts.next() {
            return Err(ReaderError::InvalidCommand(format!(
                "unexpected trailing token {:?}",
                extra
            )));
        }
        Ok(Self { verb, argument })
    }
}

/// Number of data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    #[default]
    Eight,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBits {
    #[default]
    One,
    Two,
}

/// Parity checking mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
}

/// Serial line settings applied when opening a transport (default 8N1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortSettings {
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

/// Request/response state of a [`CommandChannel`](crate::CommandChannel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Idle,
    Sending,
    AwaitingResponse,
    /// An I/O failure left the stream in an unknown position; reconnect to recover
    Faulted,
}

/// Errors that can occur during RFID operations
#[derive(Debug, thiserror::Error)]
pub enum ReaderError {
    /// The port does not exist or is held by another process
    #[error("cannot open {path}: {reason}")]
    DeviceOpen { path: String, reason: String },

    /// Baud rate or line parameters were rejected
    #[error("invalid port configuration: {0}")]
    Configuration(String),

    /// The command could not be written in full
    #[error("write failed: {0}")]
    Write(String),

    /// No complete response frame arrived in time
    #[error("timed out after {elapsed:?} waiting for response ({received} bytes received)")]
    Timeout { elapsed: Duration, received: usize },

    /// The response reached the frame limit without a terminator
    #[error("response frame exceeds {limit} bytes")]
    FrameTooLong { limit: usize },

    /// The response frame is not valid UTF-8
    #[error("malformed response frame: {0}")]
    MalformedFrame(#[from] std::str::Utf8Error),

    /// The response frame held only whitespace
    #[error("empty response frame")]
    EmptyFrame,

    /// Transport layer error while reading or clearing input
    #[error("transport error: {0}")]
    Transport(String),

    /// Parameter outside the range the device accepts
    #[error("{name} out of range: {value} (allowed {min}..={max})")]
    OutOfRange {
        name: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// Another command is already in flight on this channel
    #[error("channel busy: a command is already in flight")]
    ChannelBusy,

    /// The channel faulted on an earlier call and needs a reconnect
    #[error("channel faulted; reconnect before sending further commands")]
    Faulted,

    /// The session has no open transport
    #[error("reader not connected")]
    NotConnected,

    /// A command could not be built or parsed
    #[error("invalid command: {0}")]
    InvalidCommand(String),
}

impl ReaderError {
    /// Whether this error moves the channel into [`ChannelState::Faulted`].
    pub fn faults_channel(&self) -> bool {
        matches!(
            self,
            ReaderError::Write(_)
                | ReaderError::Timeout { .. }
                | ReaderError::FrameTooLong { .. }
                | ReaderError::Transport(_)
        )
    }
}

pub type Result<T, E = ReaderError> = std::result::Result<T, E>;
