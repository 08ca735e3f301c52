//! Line-protocol driver for UHF RFID readers.
//!
//! The reader takes ASCII commands (`READ`, `SET_PWR <dBm>`, `SET_PING <ms>`)
//! terminated by `\n` and answers each with one `\n`-terminated text line.
//! [`CommandChannel`] turns a raw byte stream into that request/response
//! protocol with timeouts, a frame size limit and explicit error kinds.
//! [`ReaderSession`] owns the transport and its connect/disconnect lifecycle.
//!
//! # Features
//!
//! - `serial` - Serial port transport for desktop using serialport crate
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use uhflib::{PortSettings, ReaderSession, SerialTransport};
//!
//! let mut reader = ReaderSession::<SerialTransport>::new();
//! reader.connect("/dev/ttyUSB0", 115200, PortSettings::default())?;
//! reader.set_power_level(20, Duration::from_secs(1))?;
//! println!("Tag: {}", reader.read_tag(Duration::from_secs(2))?);
//! reader.disconnect();
//! ```

mod channel;
mod codec;
mod reader;
mod transport;
mod types;

#[cfg(feature = "serial")]
mod serial;

// Re-exports
pub use channel::{ChannelConfig, CommandChannel, ReadTrigger};
pub use codec::{FrameCodec, MAX_FRAME_LEN, TERMINATOR};
pub use reader::{ReaderSession, SessionState};
pub use transport::{OpenTransport, RfidTransport};
pub use types::{
    ChannelState, Command, CustomVerb, DataBits, Parity, PortSettings, ReaderError, Result,
    StopBits, Verb, DEFAULT_BAUD_RATE,
};

#[cfg(feature = "serial")]
pub use serial::SerialTransport;
