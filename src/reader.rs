use log::{debug, info};
use std::time::Duration;

use crate::channel::{ChannelConfig, CommandChannel};
use crate::transport::OpenTransport;
use crate::types::{Command, PortSettings, ReaderError, Result};

/// Connection state of a [`ReaderSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
}

#[derive(Debug, Clone)]
struct PortTarget {
    path: String,
    baud_rate: u32,
    settings: PortSettings,
}

/// Owns the transport for one reader and its open/close lifecycle.
///
/// Commands go through the [`CommandChannel`] created on each successful
/// [`connect`](Self::connect). A faulted channel is recovered by connecting
/// again, which releases the old transport and starts from a clean stream.
pub struct ReaderSession<T: OpenTransport> {
    config: ChannelConfig,
    channel: Option<CommandChannel<T>>,
    target: Option<PortTarget>,
}

impl<T: OpenTransport> Default for ReaderSession<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: OpenTransport> ReaderSession<T> {
    /// Create a disconnected session with the default channel configuration
    pub fn new() -> Self {
        Self::with_config(ChannelConfig::default())
    }

    pub fn with_config(config: ChannelConfig) -> Self {
        Self {
            config,
            channel: None,
            target: None,
        }
    }

    pub fn state(&self) -> SessionState {
        if self.channel.is_some() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Open `port_path` and start a fresh channel on it.
    ///
    /// No command is sent to the device. If the session is already connected,
    /// the current transport is released first.
    pub fn connect(&mut self, port_path: &str, baud_rate: u32, settings: PortSettings) -> Result<()> {
        if baud_rate == 0 {
            return Err(ReaderError::Configuration("baud rate must be non-zero".into()));
        }

        if self.channel.is_some() {
            debug!("Releasing current transport before reopening");
            self.disconnect();
        }

        let transport = T::open(port_path, baud_rate, &settings)?;
        self.channel = Some(CommandChannel::with_config(transport, self.config.clone()));
        self.target = Some(PortTarget {
            path: port_path.to_string(),
            baud_rate,
            settings,
        });
        info!("Connected to {} at {} baud.", port_path, baud_rate);
        Ok(())
    }

    /// Reopen the port from the last successful [`connect`](Self::connect).
    ///
    /// Makes a single attempt.
    pub fn reconnect(&mut self) -> Result<()> {
        let target = self.target.clone().ok_or(ReaderError::NotConnected)?;
        self.connect(&target.path, target.baud_rate, target.settings)
    }

    /// Release the transport. Calling this while disconnected does nothing.
    pub fn disconnect(&mut self) {
        if let Some(channel) = self.channel.take() {
            drop(channel.into_inner());
            info!("Disconnected from UHF reader.");
        }
    }

    /// The active channel, or [`ReaderError::NotConnected`]
    pub fn channel(&self) -> Result<&CommandChannel<T>> {
        self.channel.as_ref().ok_or(ReaderError::NotConnected)
    }

    pub fn read_tag(&self, timeout: Duration) -> Result<String> {
        self.channel()?.read_tag(timeout)
    }

    pub fn set_power_level(&self, dbm: i32, timeout: Duration) -> Result<String> {
        self.channel()?.set_power_level(dbm, timeout)
    }

    pub fn set_ping_rate(&self, milliseconds: i64, timeout: Duration) -> Result<String> {
        self.channel()?.set_ping_rate(milliseconds, timeout)
    }

    pub fn send_command(&self, command: &Command, timeout: Duration) -> Result<String> {
        self.channel()?.send_command(command, timeout)
    }
}
