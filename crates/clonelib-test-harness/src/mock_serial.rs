//! Mock serial link for deterministic testing of clone sessions.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs. The "radio side" is scripted: each expected
//! request has a block of bytes the radio answers with, which queues up for
//! subsequent `receive()` calls.
//!
//! Unlike a command/response rig link, a clone has the radio stream many
//! frames after a single request, so responses accumulate in a receive
//! queue instead of replacing one another. An echoing cable (one that loops
//! every transmitted byte back to the receiver) is simulated with
//! [`MockTransport::set_echo`].
//!
//! # Example
//!
//! ```
//! use clonelib_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // Identify probe, answered with the radio's model id.
//! mock.expect(&[0xFE, 0xFE, 0xEE, 0xEF, 0xE0, 0x00, 0x00, 0x00, 0x00, 0xFD],
//!             &[0xFE, 0xFE, 0xEF, 0xEE, 0xE1, 0x29, 0x70, 0x00, 0x01, 0xFD]);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use clonelib_core::error::{Error, Result};
use clonelib_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The bytes the radio sends back once the request arrives.
    response: Vec<u8>,
}

/// A mock [`Transport`] standing in for a radio on a clone cable.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation, and that
/// expectation's response is appended to the receive queue. `receive()`
/// drains the queue, at most `max_chunk` bytes per call, and reports
/// [`Error::Timeout`] immediately once it is empty.
#[derive(Debug)]
pub struct MockTransport {
    expectations: VecDeque<Expectation>,
    /// Bytes waiting to be returned by `receive()`.
    rx_queue: VecDeque<u8>,
    /// Largest number of bytes a single `receive()` hands out.
    max_chunk: usize,
    /// Loop sent bytes back into the receive queue.
    echo: bool,
    connected: bool,
    /// Reads return zero bytes, as from a tty whose device went away.
    hung_up: bool,
    /// Refuse baud changes, as a link without a settable rate does.
    fixed_baud: bool,
    baud_rate: u32,
    /// Every baud rate passed to `set_baud_rate()`, in order.
    baud_log: Vec<u32>,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state at 9600 baud.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            rx_queue: VecDeque::new(),
            max_chunk: usize::MAX,
            echo: false,
            connected: true,
            hung_up: false,
            fixed_baud: false,
            baud_rate: 9600,
            baud_log: Vec::new(),
            sent_log: Vec::new(),
        }
    }

    /// Add an expected request/response pair.
    ///
    /// When `send()` is called with data matching `request`, `response` is
    /// queued for the following `receive()` calls.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Add an expected request the radio does not answer.
    pub fn expect_silent(&mut self, request: &[u8]) {
        self.expect(request, &[]);
    }

    /// Queue bytes for `receive()` without waiting for a request.
    pub fn push_incoming(&mut self, data: &[u8]) {
        self.rx_queue.extend(data);
    }

    /// Simulate a cable that echoes every transmitted byte.
    ///
    /// The echo is queued ahead of the radio's response to the same request.
    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    /// Limit how many bytes one `receive()` call returns, to exercise
    /// frames split across reads.
    pub fn set_max_chunk(&mut self, max_chunk: usize) {
        self.max_chunk = max_chunk.max(1);
    }

    /// Return a reference to all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Baud rates requested through `set_baud_rate()`, in call order.
    pub fn baud_changes(&self) -> &[u32] {
        &self.baud_log
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Number of queued bytes nobody has read yet.
    pub fn unread_bytes(&self) -> usize {
        self.rx_queue.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Make every `receive()` return `Ok(0)`, like a hung-up tty.
    pub fn set_hung_up(&mut self, hung_up: bool) {
        self.hung_up = hung_up;
    }

    /// Make `set_baud_rate()` fail with [`Error::Unsupported`].
    pub fn set_fixed_baud(&mut self, fixed_baud: bool) {
        self.fixed_baud = fixed_baud;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());

        let Some(expectation) = self.expectations.pop_front() else {
            return Err(Error::Protocol(
                "no more expectations in mock transport".into(),
            ));
        };
        if data != expectation.request.as_slice() {
            return Err(Error::Protocol(format!(
                "unexpected send data: expected {:02X?}, got {:02X?}",
                expectation.request, data
            )));
        }

        if self.echo {
            self.rx_queue.extend(data);
        }
        self.rx_queue.extend(expectation.response);
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if self.hung_up {
            return Ok(0);
        }
        if self.rx_queue.is_empty() {
            return Err(Error::Timeout);
        }

        let n = self.rx_queue.len().min(buf.len()).min(self.max_chunk);
        for (slot, byte) in buf.iter_mut().zip(self.rx_queue.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn set_baud_rate(&mut self, baud_rate: u32) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }
        if self.fixed_baud {
            return Err(Error::Unsupported("baud rate change".into()));
        }
        self.baud_log.push(baud_rate);
        self.baud_rate = baud_rate;
        Ok(())
    }

    fn baud_rate(&self) -> Option<u32> {
        Some(self.baud_rate)
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.rx_queue.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn response_follows_matching_request() {
        let mut mock = MockTransport::new();
        let request = &[0xFE, 0xFE, 0xEE, 0xEF, 0xE0, 0x00, 0x00, 0x00, 0x00, 0xFD];
        let response = &[0xFE, 0xFE, 0xEF, 0xEE, 0xE1, 0x29, 0x70, 0x00, 0x01, 0xFD];
        mock.expect(request, response);

        mock.send(request).await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock.receive(&mut buf, TIMEOUT).await.unwrap();
        assert_eq!(&buf[..n], response);
        assert!(matches!(
            mock.receive(&mut buf, TIMEOUT).await,
            Err(Error::Timeout)
        ));
    }

    #[tokio::test]
    async fn responses_accumulate() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xAA, 0xBB]);
        mock.expect(&[0x02], &[0xCC]);

        mock.send(&[0x01]).await.unwrap();
        mock.send(&[0x02]).await.unwrap();

        let mut buf = [0u8; 8];
        let n = mock.receive(&mut buf, TIMEOUT).await.unwrap();
        assert_eq!(&buf[..n], &[0xAA, 0xBB, 0xCC]);
    }

    #[tokio::test]
    async fn tracks_sent_data() {
        let mut mock = MockTransport::new();
        mock.expect_silent(&[0x01, 0x02]);
        mock.expect_silent(&[0x03, 0x04]);

        mock.send(&[0x01, 0x02]).await.unwrap();
        mock.send(&[0x03, 0x04]).await.unwrap();

        assert_eq!(mock.sent_data(), &[vec![0x01, 0x02], vec![0x03, 0x04]]);
        assert_eq!(mock.remaining_expectations(), 0);
        assert_eq!(mock.unread_bytes(), 0);
    }

    #[tokio::test]
    async fn wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xFF]);

        let err = mock.send(&[0x99]).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
        assert!(err.to_string().contains("unexpected send data"));
    }

    #[tokio::test]
    async fn no_expectations_errors() {
        let mut mock = MockTransport::new();
        assert!(matches!(
            mock.send(&[0x01]).await.unwrap_err(),
            Error::Protocol(_)
        ));
    }

    #[tokio::test]
    async fn echo_precedes_response() {
        let mut mock = MockTransport::new();
        mock.set_echo(true);
        mock.expect(&[0x10, 0x11], &[0x20]);

        mock.send(&[0x10, 0x11]).await.unwrap();

        let mut buf = [0u8; 8];
        let n = mock.receive(&mut buf, TIMEOUT).await.unwrap();
        assert_eq!(&buf[..n], &[0x10, 0x11, 0x20]);
    }

    #[tokio::test]
    async fn max_chunk_splits_reads() {
        let mut mock = MockTransport::new();
        mock.set_max_chunk(3);
        mock.push_incoming(&[1, 2, 3, 4, 5]);

        let mut buf = [0u8; 16];
        let n = mock.receive(&mut buf, TIMEOUT).await.unwrap();
        assert_eq!(&buf[..n], &[1, 2, 3]);
        let n = mock.receive(&mut buf, TIMEOUT).await.unwrap();
        assert_eq!(&buf[..n], &[4, 5]);
    }

    #[tokio::test]
    async fn small_buffer_partial_receive() {
        let mut mock = MockTransport::new();
        mock.push_incoming(&[0xAA, 0xBB, 0xCC, 0xDD]);

        let mut buf = [0u8; 2];
        let n = mock.receive(&mut buf, TIMEOUT).await.unwrap();
        assert_eq!(&buf[..n], &[0xAA, 0xBB]);
        let n = mock.receive(&mut buf, TIMEOUT).await.unwrap();
        assert_eq!(&buf[..n], &[0xCC, 0xDD]);
    }

    #[tokio::test]
    async fn records_baud_changes() {
        let mut mock = MockTransport::new();
        assert_eq!(mock.baud_rate(), Some(9600));

        mock.set_baud_rate(38_400).await.unwrap();
        mock.set_baud_rate(9600).await.unwrap();

        assert_eq!(mock.baud_changes(), &[38_400, 9600]);
        assert_eq!(mock.baud_rate(), Some(9600));
    }

    #[tokio::test]
    async fn hung_up_reads_nothing() {
        let mut mock = MockTransport::new();
        mock.push_incoming(&[0x01]);
        mock.set_hung_up(true);
        let mut buf = [0u8; 8];
        assert_eq!(mock.receive(&mut buf, TIMEOUT).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn fixed_baud_refuses_changes() {
        let mut mock = MockTransport::new();
        mock.set_fixed_baud(true);
        assert!(matches!(
            mock.set_baud_rate(38_400).await.unwrap_err(),
            Error::Unsupported(_)
        ));
        assert!(mock.baud_changes().is_empty());
        assert_eq!(mock.baud_rate(), Some(9600));
    }

    #[tokio::test]
    async fn disconnected_operations_fail() {
        let mut mock = MockTransport::new();
        mock.push_incoming(&[0x01]);
        mock.close().await.unwrap();
        assert!(!mock.is_connected());
        assert_eq!(mock.unread_bytes(), 0);

        assert!(matches!(
            mock.send(&[0x01]).await.unwrap_err(),
            Error::NotConnected
        ));
        let mut buf = [0u8; 8];
        assert!(matches!(
            mock.receive(&mut buf, TIMEOUT).await.unwrap_err(),
            Error::NotConnected
        ));
        assert!(matches!(
            mock.set_baud_rate(38_400).await.unwrap_err(),
            Error::NotConnected
        ));

        mock.set_connected(true);
        assert!(mock.is_connected());
    }
}
