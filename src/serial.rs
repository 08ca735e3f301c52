//! Serial port transport for desktop using serialport crate

use crate::transport::{OpenTransport, RfidTransport};
use crate::types::{DataBits, Parity, PortSettings, ReaderError, StopBits};
use log::debug;
use std::io::ErrorKind;
use std::time::Duration;

const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialTransport {
    /// Open `port_name` with 8N1 framing.
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self, ReaderError> {
        Self::with_settings(port_name, baud_rate, &PortSettings::default())
    }

    pub fn with_settings(
        port_name: &str,
        baud_rate: u32,
        settings: &PortSettings,
    ) -> Result<Self, ReaderError> {
        let port = serialport::new(port_name, baud_rate)
            .data_bits(settings.data_bits.into())
            .stop_bits(settings.stop_bits.into())
            .parity(settings.parity.into())
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|e| open_error(port_name, e))?;
        port.clear(serialport::ClearBuffer::Input)
            .map_err(|e| open_error(port_name, e))?;
        debug!("Opened {} at {} baud ({:?})", port_name, baud_rate, settings);

        Ok(Self::from_port(port))
    }

    /// Wrap a port that was opened elsewhere.
    pub fn from_port(port: Box<dyn serialport::SerialPort>) -> Self {
        Self { port }
    }
}

fn open_error(path: &str, err: serialport::Error) -> ReaderError {
    match err.kind() {
        serialport::ErrorKind::InvalidInput => ReaderError::Configuration(err.description),
        _ => ReaderError::DeviceOpen {
            path: path.to_string(),
            reason: err.description,
        },
    }
}

impl OpenTransport for SerialTransport {
    fn open(path: &str, baud_rate: u32, settings: &PortSettings) -> Result<Self, ReaderError> {
        Self::with_settings(path, baud_rate, settings)
    }
}

impl RfidTransport for SerialTransport {
    type Error = std::io::Error;

    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        // reads shrink the port timeout to their remaining budget
        self.port
            .set_timeout(WRITE_TIMEOUT)
            .map_err(std::io::Error::other)?;
        std::io::Write::write_all(&mut self.port, data)?;
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        self.port
            .set_timeout(Duration::from_millis(timeout_ms as u64))
            .map_err(std::io::Error::other)?;
        match std::io::Read::read(&mut self.port, buf) {
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            other => other,
        }
    }

    fn clear_input(&mut self) -> Result<(), Self::Error> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(std::io::Error::other)
    }
}

impl From<DataBits> for serialport::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Five => serialport::DataBits::Five,
            DataBits::Six => serialport::DataBits::Six,
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        }
    }
}

impl From<StopBits> for serialport::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        }
    }
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}
