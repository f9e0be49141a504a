//! Transport trait for radio communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a radio in
//! clone mode. The production implementation is the serial port in
//! `clonelib-transport`; tests use `MockTransport` from
//! `clonelib-test-harness`.
//!
//! Clone sessions in `clonelib-icom` own a `Box<dyn Transport>` exclusively
//! for the duration of one clone, so no implementation needs to be safe for
//! concurrent readers.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};

/// Asynchronous byte-level transport to a radio.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the radio.
    ///
    /// Implementations must not return until all bytes have been handed to
    /// the underlying link and flushed; a clone frame is only meaningful to
    /// the radio as a whole.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the radio into the provided buffer.
    ///
    /// Returns the number of bytes actually read. Will wait up to `timeout`
    /// for data to arrive; returns [`Error::Timeout`] if nothing was received
    /// within the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Change the link speed.
    ///
    /// Used by the hi-speed clone switch. Transports that have no notion of
    /// a baud rate keep the default, which reports the operation as
    /// unsupported.
    async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        Err(Error::Unsupported(format!(
            "changing baud rate to {baud_rate}"
        )))
    }

    /// Current link speed, if the transport has one.
    fn baud_rate(&self) -> Option<u32> {
        None
    }

    /// Close the transport connection.
    ///
    /// After calling `close()`, subsequent `send()` and `receive()` calls
    /// should return [`Error::NotConnected`].
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn send(&mut self, _data: &[u8]) -> Result<()> {
            Ok(())
        }

        async fn receive(&mut self, _buf: &mut [u8], _timeout: Duration) -> Result<usize> {
            Err(Error::Timeout)
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn default_set_baud_rate_is_unsupported() {
        let mut t = NullTransport;
        let err = t.set_baud_rate(38_400).await.unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert!(err.to_string().contains("38400"));
        assert_eq!(t.baud_rate(), None);
    }

    #[test]
    fn transport_is_object_safe() {
        let boxed: Box<dyn Transport> = Box::new(NullTransport);
        assert!(boxed.is_connected());
    }
}
