//! Serial port transport for clone-mode cables.
//!
//! [`SerialTransport`] implements [`Transport`] on top of `tokio-serial`.
//! Icom clone mode runs at 9600 baud, 8N1, no flow control; radios that
//! support it are moved to 38400 baud mid-session through
//! [`Transport::set_baud_rate`], which reconfigures the open port in place.
//!
//! # Example
//!
//! ```no_run
//! use clonelib_transport::SerialTransport;
//! use clonelib_core::transport::Transport;
//!
//! # async fn example() -> clonelib_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 9600).await?;
//! transport.set_baud_rate(38400).await?;
//! assert_eq!(transport.baud_rate(), Some(38400));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use clonelib_core::error::{Error, Result};
use clonelib_core::transport::Transport;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPort, SerialPortBuilderExt, SerialStream};

/// Serial port configuration.
///
/// The default is the clone-mode link: 9600 baud, 8 data bits, 1 stop bit,
/// no parity, no flow control.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Initial baud rate.
    pub baud_rate: u32,
    /// Number of data bits.
    pub data_bits: DataBits,
    /// Number of stop bits.
    pub stop_bits: StopBits,
    /// Parity checking.
    pub parity: Parity,
    /// Flow control. Clone cables have no handshake lines, so leave this off.
    pub flow_control: FlowControl,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: FlowControl::None,
        }
    }
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBits {
    Seven,
    Eight,
}

impl From<DataBits> for tokio_serial::DataBits {
    fn from(bits: DataBits) -> Self {
        match bits {
            DataBits::Seven => tokio_serial::DataBits::Seven,
            DataBits::Eight => tokio_serial::DataBits::Eight,
        }
    }
}

/// Number of stop bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    One,
    Two,
}

impl From<StopBits> for tokio_serial::StopBits {
    fn from(bits: StopBits) -> Self {
        match bits {
            StopBits::One => tokio_serial::StopBits::One,
            StopBits::Two => tokio_serial::StopBits::Two,
        }
    }
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for tokio_serial::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => tokio_serial::Parity::None,
            Parity::Odd => tokio_serial::Parity::Odd,
            Parity::Even => tokio_serial::Parity::Even,
        }
    }
}

/// Flow control mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for tokio_serial::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => tokio_serial::FlowControl::None,
            FlowControl::Software => tokio_serial::FlowControl::Software,
            FlowControl::Hardware => tokio_serial::FlowControl::Hardware,
        }
    }
}

/// Map a port I/O failure to the library error, treating a vanished device
/// (USB cable pulled) as a lost connection.
fn link_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::BrokenPipe | io::ErrorKind::NotConnected | io::ErrorKind::UnexpectedEof => {
            Error::ConnectionLost
        }
        _ => Error::Io(e),
    }
}

/// Serial port transport for clone-mode cables.
pub struct SerialTransport {
    port: Option<SerialStream>,
    port_name: String,
    baud_rate: u32,
}

impl SerialTransport {
    /// Open a serial port at `baud_rate` with 8N1 and no flow control.
    ///
    /// * `port` - Serial port path (e.g., "/dev/ttyUSB0" on Linux, "COM3" on Windows)
    /// * `baud_rate` - Initial link speed; 9600 for every Icom clone
    pub async fn open(port: &str, baud_rate: u32) -> Result<Self> {
        let config = SerialConfig {
            baud_rate,
            ..Default::default()
        };
        Self::open_with_config(port, config).await
    }

    /// Open a serial port with full configuration control.
    pub async fn open_with_config(port: &str, config: SerialConfig) -> Result<Self> {
        tracing::debug!(
            port = %port,
            baud_rate = config.baud_rate,
            data_bits = ?config.data_bits,
            stop_bits = ?config.stop_bits,
            parity = ?config.parity,
            flow_control = ?config.flow_control,
            "Opening serial port"
        );

        let mut stream = tokio_serial::new(port, config.baud_rate)
            .data_bits(config.data_bits.into())
            .stop_bits(config.stop_bits.into())
            .parity(config.parity.into())
            .flow_control(config.flow_control.into())
            .open_native_async()
            .map_err(|e| {
                tracing::error!(port = %port, error = %e, "Failed to open serial port");
                Error::Transport(format!("failed to open serial port {port}: {e}"))
            })?;

        // Self-powered clone cables (OPC-478 style level shifters) can be
        // held in reset by an asserted DTR or RTS.
        if let Err(e) = stream.write_data_terminal_ready(false) {
            tracing::warn!(port = %port, error = %e, "Failed to de-assert DTR");
        }
        if let Err(e) = stream.write_request_to_send(false) {
            tracing::warn!(port = %port, error = %e, "Failed to de-assert RTS");
        }

        tracing::info!(port = %port, baud_rate = config.baud_rate, "Serial port opened");

        Ok(Self {
            port: Some(stream),
            port_name: port.to_string(),
            baud_rate: config.baud_rate,
        })
    }

    /// Get the name of the serial port.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        tracing::trace!(port = %self.port_name, bytes = data.len(), "Sending {:02X?}", data);

        port.write_all(data).await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to send data");
            link_error(e)
        })?;
        port.flush().await.map_err(|e| {
            tracing::error!(port = %self.port_name, error = %e, "Failed to flush serial port");
            link_error(e)
        })?;

        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        match tokio::time::timeout(timeout, port.read(buf)).await {
            Ok(Ok(0)) if !buf.is_empty() => {
                // A hung-up tty reads as end of file.
                tracing::warn!(port = %self.port_name, "Serial port closed (0 bytes read)");
                Err(Error::ConnectionLost)
            }
            Ok(Ok(n)) => {
                tracing::trace!(port = %self.port_name, bytes = n, "Received {:02X?}", &buf[..n]);
                Ok(n)
            }
            Ok(Err(e)) => {
                tracing::error!(port = %self.port_name, error = %e, "Failed to receive data");
                Err(link_error(e))
            }
            Err(_) => Err(Error::Timeout),
        }
    }

    async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        let port = self.port.as_mut().ok_or(Error::NotConnected)?;

        // Anything still queued must leave at the old speed.
        port.flush().await.map_err(link_error)?;
        SerialPort::set_baud_rate(port, baud_rate).map_err(|e| {
            tracing::error!(port = %self.port_name, baud_rate, error = %e, "Failed to set baud rate");
            Error::Transport(format!(
                "failed to set {} to {baud_rate} baud: {e}",
                self.port_name
            ))
        })?;

        tracing::info!(
            port = %self.port_name,
            from = self.baud_rate,
            to = baud_rate,
            "Baud rate changed"
        );
        self.baud_rate = baud_rate;
        Ok(())
    }

    fn baud_rate(&self) -> Option<u32> {
        self.port.as_ref().map(|_| self.baud_rate)
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut port) = self.port.take() {
            if let Err(e) = port.flush().await {
                tracing::warn!(port = %self.port_name, error = %e, "Failed to flush before closing");
            }
            tracing::info!(port = %self.port_name, "Serial port closed");
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        if self.port.is_some() {
            tracing::debug!(port = %self.port_name, "SerialTransport dropped, closing port");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_clone_mode_link() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.data_bits, DataBits::Eight);
        assert_eq!(config.stop_bits, StopBits::One);
        assert_eq!(config.parity, Parity::None);
        assert_eq!(config.flow_control, FlowControl::None);
    }

    #[test]
    fn config_converts_to_tokio_serial() {
        assert_eq!(
            tokio_serial::DataBits::from(DataBits::Eight),
            tokio_serial::DataBits::Eight
        );
        assert_eq!(
            tokio_serial::StopBits::from(StopBits::Two),
            tokio_serial::StopBits::Two
        );
        assert_eq!(tokio_serial::Parity::from(Parity::Odd), tokio_serial::Parity::Odd);
        assert_eq!(
            tokio_serial::FlowControl::from(FlowControl::None),
            tokio_serial::FlowControl::None
        );
    }

    #[test]
    fn vanished_device_is_connection_lost() {
        let e = link_error(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(matches!(e, Error::ConnectionLost));
        let e = link_error(io::Error::new(io::ErrorKind::PermissionDenied, "busy"));
        assert!(matches!(e, Error::Io(_)));
    }

    #[tokio::test]
    async fn open_missing_port_is_transport_error() {
        let result = SerialTransport::open("/dev/clonelib-no-such-port", 9600).await;
        match result {
            Err(Error::Transport(msg)) => assert!(msg.contains("clonelib-no-such-port")),
            Err(other) => panic!("expected Transport error, got {other:?}"),
            Ok(_) => panic!("opening a missing port should fail"),
        }
    }
}
