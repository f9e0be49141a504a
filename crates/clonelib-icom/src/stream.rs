//! Buffered frame reader for the radio side of the cable.
//!
//! [`RadioStream`] owns the receive buffer for a whole clone session. Reads
//! are drained into complete [`IcfFrame`]s; bytes belonging to a frame that
//! has not finished arriving stay buffered for the next call.
//!
//! Some cables loop every transmitted byte back to the receiver. The stream
//! notices our own frames coming back, drops them, and remembers whether the
//! cable echoes so the write path knows whether to wait for the echo of each
//! data frame.

use std::collections::VecDeque;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use clonelib_core::{Error, Result, Transport};

use crate::frame::{IcfFrame, PREAMBLE, TERMINATOR, parse_next};

/// Buffered bytes after which a status read returns so progress can be
/// reported.
const STATUS_THRESHOLD: usize = 128;

/// Hard cap on buffered bytes per read, so a stream of garbage cannot keep
/// us reading forever.
const READ_GUARD: usize = 1024;

/// Scratch buffer size for a single transport read.
const CHUNK_SIZE: usize = 256;

/// When [`RadioStream::get_frames`] stops reading and returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadUntil {
    /// Return once more than 128 bytes including a terminator are buffered.
    Status,
    /// Return as soon as any terminator is buffered.
    OneFrame,
    /// Keep reading until the link goes quiet.
    Exhausted,
}

/// Frame reader with echo detection.
#[derive(Debug)]
pub struct RadioStream {
    buf: BytesMut,
    /// `None` until the first batch of frames tells us either way.
    echo: Option<bool>,
    /// Radio frames read while expecting an echo, handed out by the next
    /// `get_frames` call.
    held: VecDeque<IcfFrame>,
    read_timeout: Duration,
}

impl RadioStream {
    /// Create an empty stream whose reads wait up to `read_timeout`.
    pub fn new(read_timeout: Duration) -> Self {
        RadioStream {
            buf: BytesMut::with_capacity(READ_GUARD + CHUNK_SIZE),
            echo: None,
            held: VecDeque::new(),
            read_timeout,
        }
    }

    /// Whether the cable echoes our own frames, once known.
    pub fn echo(&self) -> Option<bool> {
        self.echo
    }

    /// Bytes received but not yet part of a complete frame.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// Read whatever the radio has sent and return the complete frames,
    /// minus our own echoes.
    ///
    /// A quiet link is not an error: an empty vector means nothing complete
    /// arrived within the read timeout.
    pub async fn get_frames(
        &mut self,
        transport: &mut dyn Transport,
        until: ReadUntil,
    ) -> Result<Vec<IcfFrame>> {
        self.fill(transport, until).await?;
        let mut frames: Vec<IcfFrame> = self.held.drain(..).collect();
        frames.extend(self.process_frames()?);
        Ok(frames)
    }

    /// Consume the echo of the frame just sent, if the cable echoes.
    ///
    /// Radio frames found instead are kept for the next
    /// [`get_frames`](Self::get_frames) call.
    pub async fn munch_echo(&mut self, transport: &mut dyn Transport) -> Result<()> {
        if self.echo == Some(false) {
            return Ok(());
        }
        self.fill(transport, ReadUntil::OneFrame).await?;
        let frames = self.process_frames()?;
        if !frames.is_empty() {
            tracing::warn!(
                "Expected to read one echo frame, found {} radio frame(s)",
                frames.len()
            );
            if let Some(first) = frames.first() {
                tracing::warn!("Expected PC echo but found radio frame: {first}");
            }
            self.held.extend(frames);
        }
        Ok(())
    }

    async fn fill(&mut self, transport: &mut dyn Transport, until: ReadUntil) -> Result<()> {
        let mut chunk = [0u8; CHUNK_SIZE];
        loop {
            let n = match transport.receive(&mut chunk, self.read_timeout).await {
                Ok(n) => n,
                Err(Error::Timeout) => {
                    if until == ReadUntil::OneFrame {
                        tracing::debug!("Hit timeout before one frame");
                    }
                    break;
                }
                Err(e) => return Err(e),
            };
            if n == 0 {
                tracing::warn!("Transport returned no data; link closed");
                return Err(Error::ConnectionLost);
            }
            self.buf.extend_from_slice(&chunk[..n]);

            let has_end = self.buf.contains(&TERMINATOR);
            match until {
                ReadUntil::OneFrame if has_end => break,
                ReadUntil::Status if has_end && self.buf.len() > STATUS_THRESHOLD => break,
                _ => {}
            }
            if self.buf.len() > READ_GUARD {
                break;
            }
        }
        Ok(())
    }

    fn process_frames(&mut self) -> Result<Vec<IcfFrame>> {
        let mut frames = Vec::new();
        loop {
            // Hi-speed frames arrive behind a longer run of preamble bytes.
            while self.buf.starts_with(&[PREAMBLE, PREAMBLE, PREAMBLE]) {
                self.buf.advance(1);
            }

            let (frame, consumed) = match parse_next(&self.buf) {
                Ok((Some(frame), rest)) => {
                    let consumed = self.buf.len() - rest.len();
                    (frame, consumed)
                }
                Ok((None, _)) => break,
                Err(e) => {
                    tracing::error!("Out of sync with radio: {:02X?}", &self.buf[..]);
                    return Err(e);
                }
            };
            self.buf.advance(consumed);

            if frame.is_echo() {
                if self.echo.is_none() {
                    tracing::info!("Detected an echoing cable");
                    self.echo = Some(true);
                }
            } else {
                tracing::debug!("Received frame: {frame}");
                frames.push(frame);
            }
        }

        if !frames.is_empty() && self.echo.is_none() {
            tracing::info!("Non-echoing cable detected");
            self.echo = Some(false);
        }
        Ok(frames)
    }
}
