use crate::types::{PortSettings, ReaderError};

/// Trait for RFID reader communication backends.
/// Implement this trait for different transports (serial port, test doubles, etc.)
pub trait RfidTransport {
    /// Error type for transport operations
    type Error: std::fmt::Debug;

    /// Write data to the transport, returning the number of bytes accepted
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Read data from the transport with a timeout in milliseconds.
    ///
    /// `Ok(0)` means nothing arrived before the timeout expired.
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Clear the input buffer
    fn clear_input(&mut self) -> Result<(), Self::Error>;
}

/// A transport that can be opened by port path, used by
/// [`ReaderSession`](crate::ReaderSession) to manage the connection lifecycle.
pub trait OpenTransport: RfidTransport + Sized {
    /// Open `path` at `baud_rate` with the given line settings.
    ///
    /// Implementations report a missing or busy device as
    /// [`ReaderError::DeviceOpen`] and rejected line parameters as
    /// [`ReaderError::Configuration`].
    fn open(path: &str, baud_rate: u32, settings: &PortSettings) -> Result<Self, ReaderError>;
}
