//! CloneBuilder -- fluent builder for constructing [`CloneSession`]s.
//!
//! Separates configuration from construction so that callers can set up the
//! serial port, timing, hi-speed policy, capture sink, and cancellation
//! before the session takes ownership of the transport.
//!
//! # Example
//!
//! ```no_run
//! use clonelib_icom::builder::CloneBuilder;
//! use clonelib_icom::models::ic_2820h;
//!
//! # async fn example() -> clonelib_core::Result<()> {
//! let radio = ic_2820h();
//! let mut session = CloneBuilder::new(&radio)
//!     .serial_port("/dev/ttyUSB0")
//!     .allow_hispeed(false)
//!     .build()
//!     .await?;
//! let image = session.clone_from_radio().await?;
//! # Ok(())
//! # }
//! ```

use std::io::Write;
use std::time::Duration;

use clonelib_core::error::{Error, Result};
use clonelib_core::radio::RadioDescriptor;
use clonelib_core::transport::Transport;
use tokio_util::sync::CancellationToken;

use crate::session::CloneSession;

/// Timing and policy knobs for a clone session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneConfig {
    /// How long a single transport read waits for data.
    pub read_timeout: Duration,
    /// Reads to wait for the identify reply before giving up.
    pub identify_attempts: u32,
    /// Consecutive empty reads tolerated mid-transfer before the data
    /// stream is considered stalled.
    pub max_idle_polls: u32,
    /// Pause after each data frame sent to the radio.
    pub write_pacing: Duration,
    /// Polls for the radio's clone result after the end frame.
    pub result_attempts: u32,
    /// Pause between result polls that returned nothing.
    pub result_poll_interval: Duration,
    /// Use the hi-speed link when the radio supports it.
    pub allow_hispeed: bool,
    /// Capacity of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for CloneConfig {
    fn default() -> Self {
        CloneConfig {
            read_timeout: Duration::from_millis(100),
            identify_attempts: 60,
            max_idle_polls: 100,
            write_pacing: Duration::from_millis(5),
            result_attempts: 10,
            result_poll_interval: Duration::from_millis(500),
            allow_hispeed: true,
            event_capacity: 64,
        }
    }
}

impl CloneConfig {
    /// No delays anywhere: for simulated radios and tests.
    pub fn immediate() -> Self {
        CloneConfig {
            read_timeout: Duration::ZERO,
            identify_attempts: 3,
            max_idle_polls: 3,
            write_pacing: Duration::ZERO,
            result_attempts: 3,
            result_poll_interval: Duration::ZERO,
            ..CloneConfig::default()
        }
    }
}

/// Fluent builder for [`CloneSession`].
///
/// The session borrows the radio descriptor for its whole lifetime, so the
/// descriptor must outlive it.
pub struct CloneBuilder<'a> {
    radio: &'a RadioDescriptor,
    config: CloneConfig,
    serial_port: Option<String>,
    capture: Option<Box<dyn Write + Send>>,
    cancel: Option<CancellationToken>,
}

impl<'a> CloneBuilder<'a> {
    /// Create a new builder for the given radio with default timing.
    pub fn new(radio: &'a RadioDescriptor) -> Self {
        CloneBuilder {
            radio,
            config: CloneConfig::default(),
            serial_port: None,
            capture: None,
            cancel: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: CloneConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Set the per-read timeout (default: 100ms).
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set how many reads to wait for the identify reply (default: 60).
    pub fn identify_attempts(mut self, n: u32) -> Self {
        self.config.identify_attempts = n;
        self
    }

    /// Set how many consecutive empty reads end a stalled transfer
    /// (default: 100).
    pub fn max_idle_polls(mut self, n: u32) -> Self {
        self.config.max_idle_polls = n;
        self
    }

    /// Set the pause after each data frame written (default: 5ms).
    ///
    /// Some USB serial adapters drop bytes when fed back to back.
    pub fn write_pacing(mut self, delay: Duration) -> Self {
        self.config.write_pacing = delay;
        self
    }

    /// Set how many times to poll for the clone result (default: 10).
    pub fn result_attempts(mut self, n: u32) -> Self {
        self.config.result_attempts = n;
        self
    }

    /// Set the pause between empty result polls (default: 500ms).
    pub fn result_poll_interval(mut self, delay: Duration) -> Self {
        self.config.result_poll_interval = delay;
        self
    }

    /// Enable or disable the hi-speed link for radios that support it
    /// (default: true).
    pub fn allow_hispeed(mut self, enabled: bool) -> Self {
        self.config.allow_hispeed = enabled;
        self
    }

    /// Set the event channel capacity (default: 64).
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Copy every clone frame written to the radio into `sink`.
    pub fn capture(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.capture = Some(sink);
        self
    }

    /// Abort the clone between blocks once `token` is cancelled.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Build a [`CloneSession`] with a caller-provided transport.
    ///
    /// This is the entry point for testing (pass a `MockTransport` from
    /// `clonelib-test-harness`) and for callers that manage the link
    /// themselves.
    pub async fn build_with_transport(
        self,
        transport: Box<dyn Transport>,
    ) -> Result<CloneSession<'a>> {
        self.radio.validate()?;
        if self.config.event_capacity == 0 {
            return Err(Error::InvalidParameter(
                "event_capacity must be at least 1".into(),
            ));
        }

        Ok(CloneSession::new(
            self.radio,
            transport,
            self.config,
            self.capture,
            self.cancel.unwrap_or_default(),
        ))
    }

    /// Build a [`CloneSession`] over a serial port opened at the radio's
    /// initial baud rate.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<CloneSession<'a>> {
        let port = self
            .serial_port
            .as_ref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let transport = clonelib_transport::SerialTransport::open(port, self.radio.baud_rate).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}
