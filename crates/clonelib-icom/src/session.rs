//! CloneSession -- one full clone between the computer and a radio.
//!
//! A session drives the clone-mode handshake over an owned [`Transport`]:
//! identify the radio, optionally switch to the hi-speed link, then stream
//! the memory image in data frames in one direction or the other. It is
//! single-use: once a clone has finished (or failed) the session stays in
//! its terminal state and a new one must be built to try again.
//!
//! Progress and stage changes are published on a broadcast channel (see
//! [`CloneSession::subscribe`]).

use std::borrow::Cow;
use std::io::Write;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use clonelib_core::error::{Error, Result};
use clonelib_core::events::{CloneEvent, CloneState, Direction};
use clonelib_core::memmap::MemoryMap;
use clonelib_core::radio::RadioDescriptor;
use clonelib_core::transport::Transport;

use crate::block::{DataBlock, encode_chunk};
use crate::builder::CloneConfig;
use crate::frame::{
    CMD_CLONE_DAT, CMD_CLONE_END, CMD_CLONE_HISPEED, CMD_CLONE_ID, CMD_CLONE_IN, CMD_CLONE_OK,
    CMD_CLONE_OUT, IcfFrame, serialize, serialize_padded,
};
use crate::ident::ModelInfo;
use crate::payload::PayloadCodec;
use crate::stream::{RadioStream, ReadUntil};

/// Preamble bytes sent ahead of the hi-speed switch frame.
const HISPEED_SWITCH_PAD: usize = 20;

/// Preamble bytes sent ahead of the clone command once at hi-speed.
const HISPEED_START_PAD: usize = 14;

/// Bytes read and discarded after the hi-speed switch frame.
const HISPEED_DRAIN: usize = 128;

const STAGE_IDENTIFY: &str = "identify";
const STAGE_HISPEED: &str = "hispeed switch";
const STAGE_TRANSFER: &str = "data transfer";
const STAGE_RESULT: &str = "clone result";

/// Rewrap link failures so the message names the stage that failed.
///
/// Wire-format and radio-reported errors pass through untouched.
fn at_stage(stage: &'static str) -> impl FnOnce(Error) -> Error {
    move |e| match e {
        Error::Transport(msg) => Error::Transport(format!("{stage}: {msg}")),
        e if e.is_link_failure() => Error::Transport(format!("{stage}: {e}")),
        e => e,
    }
}

/// A clone session bound to one radio descriptor and one transport.
///
/// Constructed via [`CloneBuilder`](crate::builder::CloneBuilder).
pub struct CloneSession<'a> {
    radio: &'a RadioDescriptor,
    transport: Box<dyn Transport>,
    codec: PayloadCodec,
    config: CloneConfig,
    stream: RadioStream,
    state: CloneState,
    model_info: Option<ModelInfo>,
    /// Address the next data block should start at, for gap logging.
    expected_addr: usize,
    last_block_size: usize,
    hispeed_active: bool,
    event_tx: broadcast::Sender<CloneEvent>,
    capture: Option<Box<dyn Write + Send>>,
    cancel: CancellationToken,
}

impl<'a> CloneSession<'a> {
    pub(crate) fn new(
        radio: &'a RadioDescriptor,
        transport: Box<dyn Transport>,
        config: CloneConfig,
        capture: Option<Box<dyn Write + Send>>,
        cancel: CancellationToken,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity);
        CloneSession {
            radio,
            transport,
            codec: PayloadCodec::for_radio(radio),
            stream: RadioStream::new(config.read_timeout),
            config,
            state: CloneState::Idle,
            model_info: None,
            expected_addr: 0,
            last_block_size: 0,
            hispeed_active: false,
            event_tx,
            capture,
            cancel,
        }
    }

    /// Current stage of the session.
    pub fn state(&self) -> CloneState {
        self.state
    }

    /// The radio descriptor this session clones.
    pub fn radio(&self) -> &RadioDescriptor {
        self.radio
    }

    /// The timing configuration in effect.
    pub fn config(&self) -> &CloneConfig {
        &self.config
    }

    /// What the radio reported about itself, once identified.
    pub fn model_info(&self) -> Option<&ModelInfo> {
        self.model_info.as_ref()
    }

    /// Whether the link was switched to the hi-speed baud rate.
    pub fn is_hispeed_active(&self) -> bool {
        self.hispeed_active
    }

    /// Subscribe to stage changes and progress.
    pub fn subscribe(&self) -> broadcast::Receiver<CloneEvent> {
        self.event_tx.subscribe()
    }

    /// Give the transport back, ending the session.
    pub fn into_transport(self) -> Box<dyn Transport> {
        self.transport
    }

    /// Read the radio's whole memory image.
    ///
    /// The returned map is always exactly `memsize` bytes. Address ranges
    /// the radio never sent stay zero.
    pub async fn clone_from_radio(&mut self) -> Result<MemoryMap> {
        self.begin()?;
        let result = self.run_clone_from_radio().await;
        self.finish(result)
    }

    /// Write `image` into the radio.
    ///
    /// `image` must be exactly `memsize` bytes, laid out as returned by
    /// [`clone_from_radio`](Self::clone_from_radio).
    pub async fn clone_to_radio(&mut self, image: &MemoryMap) -> Result<()> {
        self.begin()?;
        let result = self.run_clone_to_radio(image).await;
        self.finish(result)
    }

    // ---------------------------------------------------------------
    // Read path
    // ---------------------------------------------------------------

    async fn run_clone_from_radio(&mut self) -> Result<MemoryMap> {
        self.identify()
            .await
            .map_err(at_stage(STAGE_IDENTIFY))?;
        self.start_clone(CMD_CLONE_OUT).await?;

        self.set_state(CloneState::Transferring);
        let mut map = MemoryMap::new(self.radio.memsize);
        self.receive_blocks(&mut map)
            .await
            .map_err(at_stage(STAGE_TRANSFER))?;

        if self.radio.highbit_flip {
            debug!("Flipping high bits of received image");
            map = map.flip_high_bits();
        }
        Ok(map)
    }

    async fn receive_blocks(&mut self, map: &mut MemoryMap) -> Result<()> {
        let wide = self.radio.is_wide_address();
        let max_idle = self.config.max_idle_polls.max(1);
        let mut idle = 0;
        let mut got_end = false;

        while !got_end {
            self.check_cancelled()?;
            let frames = self
                .stream
                .get_frames(self.transport.as_mut(), ReadUntil::Status)
                .await?;

            if frames.is_empty() {
                idle += 1;
                if idle >= max_idle {
                    tracing::error!(
                        "Clone from radio ending at address {:06X} before clone end; buffer is {:02X?}",
                        self.expected_addr,
                        self.stream.buffered()
                    );
                    return Err(Error::Transport(
                        "data stream stopped before end-of-clone received".into(),
                    ));
                }
                continue;
            }
            idle = 0;

            for frame in frames {
                match frame.cmd {
                    CMD_CLONE_DAT => {
                        let decoded = self.codec.decode(&frame.payload)?;
                        let block = DataBlock::parse(&decoded, wide)?;
                        block.verify()?;
                        self.note_block(&block);
                        map.write(block.addr, &block.data)?;
                        self.emit_progress(Direction::FromRadio, block.end());
                    }
                    CMD_CLONE_END => {
                        debug!(
                            "End frame ({} bytes): {:02X?}",
                            frame.payload.len(),
                            frame.payload
                        );
                        debug!("Last addr: {:04X}", self.expected_addr);
                        self.set_state(CloneState::Finishing);
                        got_end = true;
                    }
                    _ => debug!("Ignoring unexpected frame: {frame}"),
                }
            }
        }
        Ok(())
    }

    /// Log gaps and block-size changes. Neither is an error: radios skip
    /// unused regions and change block size between regions.
    fn note_block(&mut self, block: &DataBlock) {
        let size = block.data.len();
        if size != self.last_block_size {
            debug!(
                "Block size change from {} to {} at {:04X}",
                self.last_block_size, size, block.addr
            );
            self.last_block_size = size;
        }
        if block.addr != self.expected_addr {
            debug!("Gap {:04X} - {:04X}", self.expected_addr, block.addr);
        }
        self.expected_addr = block.end();
    }

    // ---------------------------------------------------------------
    // Write path
    // ---------------------------------------------------------------

    async fn run_clone_to_radio(&mut self, image: &MemoryMap) -> Result<()> {
        if image.len() != self.radio.memsize {
            return Err(Error::InvalidParameter(format!(
                "image is {} bytes, {} expects {}",
                image.len(),
                self.radio.name,
                self.radio.memsize
            )));
        }

        // A previous clone may have left the link at hi-speed; always start slow.
        let stale_baud = self
            .transport
            .baud_rate()
            .is_some_and(|b| b != self.radio.baud_rate);
        if self.hispeed_enabled() || stale_baud {
            self.switch_baud(self.radio.baud_rate)
                .await
                .map_err(at_stage(STAGE_HISPEED))?;
        }

        self.identify()
            .await
            .map_err(at_stage(STAGE_IDENTIFY))?;
        if self.radio.double_ident {
            self.identify()
                .await
                .map_err(at_stage(STAGE_IDENTIFY))?;
        }
        self.check_revision()?;

        self.start_clone(CMD_CLONE_IN).await?;

        let image: Cow<'_, MemoryMap> = if self.radio.highbit_flip {
            debug!("Flipping high bits of image");
            Cow::Owned(image.flip_high_bits())
        } else {
            Cow::Borrowed(image)
        };

        self.set_state(CloneState::Transferring);
        self.send_blocks(&image)
            .await
            .map_err(at_stage(STAGE_TRANSFER))?;

        self.set_state(CloneState::Finishing);
        self.await_result()
            .await
            .map_err(at_stage(STAGE_RESULT))
    }

    async fn send_blocks(&mut self, image: &MemoryMap) -> Result<()> {
        let radio = self.radio;
        let wide = radio.is_wide_address();
        for range in radio.ranges.iter() {
            debug!(
                "Sending memory range {:06X} - {:06X} @ {} bytes",
                range.start, range.end, range.block_size
            );
            for addr in (range.start..range.end).step_by(range.block_size) {
                self.check_cancelled()?;
                let size = range.block_size.min(range.end - addr);
                let chunk = encode_chunk(addr, image.read(addr, size)?, wide);
                let payload = self.codec.encode(&chunk, true);
                self.send_frame(CMD_CLONE_DAT, &payload).await?;
                self.stream.munch_echo(self.transport.as_mut()).await?;
                self.emit_progress(Direction::ToRadio, addr + size);
                if !self.config.write_pacing.is_zero() {
                    tokio::time::sleep(self.config.write_pacing).await;
                }
            }
        }

        let endframe = self.codec.encode_plain(&radio.endframe);
        self.send_frame(CMD_CLONE_END, &endframe).await?;
        if let Some(sink) = self.capture.as_mut() {
            if let Err(e) = sink.flush() {
                tracing::warn!("Failed to flush clone capture: {e}");
            }
        }
        Ok(())
    }

    async fn await_result(&mut self) -> Result<()> {
        let mut frames: Vec<IcfFrame> = Vec::new();
        for _ in 0..self.config.result_attempts.max(1) {
            self.check_cancelled()?;
            frames.extend(
                self.stream
                    .get_frames(self.transport.as_mut(), ReadUntil::Exhausted)
                    .await?,
            );
            if !frames.is_empty() {
                break;
            }
            debug!("Waiting for clone result...");
            if !self.config.result_poll_interval.is_zero() {
                tokio::time::sleep(self.config.result_poll_interval).await;
            }
        }

        let Some(result) = frames.last() else {
            return Err(Error::Transport("did not get clone result from radio".into()));
        };
        if result.cmd != CMD_CLONE_OK {
            tracing::error!("Clone failed result frame: {result}");
            return Err(Error::RadioReportedFailure(format!(
                "radio rejected clone: {result}"
            )));
        }
        debug!("Clone result frame: {result}");
        match result.payload.first() {
            Some(0x00) => Ok(()),
            Some(code) => Err(Error::RadioReportedFailure(format!(
                "result code 0x{code:02X}"
            ))),
            None => Err(Error::RadioReportedFailure("empty result frame".into())),
        }
    }

    fn check_revision(&self) -> Result<()> {
        let Some(radio) = self.model_info.as_ref().and_then(|m| m.revision) else {
            return Ok(());
        };
        let image = self.radio.image_revision();
        if radio != image {
            return Err(Error::RevisionMismatch { radio, image });
        }
        Ok(())
    }

    // ---------------------------------------------------------------
    // Shared handshake
    // ---------------------------------------------------------------

    async fn identify(&mut self) -> Result<()> {
        self.set_state(CloneState::Identifying);
        let probe = self.codec.encode_plain(&[0x00; 4]);
        self.send_frame(CMD_CLONE_ID, &probe).await?;

        let mut frames = Vec::new();
        for _ in 0..self.config.identify_attempts.max(1) {
            self.check_cancelled()?;
            frames = self
                .stream
                .get_frames(self.transport.as_mut(), ReadUntil::Status)
                .await?;
            if !frames.is_empty() {
                break;
            }
        }

        let reply = match frames.as_slice() {
            [] => return Err(Error::Timeout),
            [reply] => reply,
            _ => {
                return Err(Error::Protocol(format!(
                    "unexpected response from radio: {} frames",
                    frames.len()
                )));
            }
        };
        debug!("Model query result: {reply}");

        let info = ModelInfo::decode(&reply.payload);
        if !info.matches(&self.radio.model) {
            tracing::info!("This model: {:02X?}", info.model);
            tracing::info!("Supported model: {:02X?}", self.radio.model);
            return Err(Error::ModelMismatch {
                expected: self.radio.model,
                found: info.model,
            });
        }
        self.model_info = Some(info);
        Ok(())
    }

    fn hispeed_enabled(&self) -> bool {
        self.radio.supports_hispeed && self.config.allow_hispeed
    }

    /// Tell the radio to start sending (`CMD_CLONE_OUT`) or receiving
    /// (`CMD_CLONE_IN`), via the hi-speed switch when enabled.
    async fn start_clone(&mut self, cmd: u8) -> Result<()> {
        if self.hispeed_enabled() {
            self.set_state(CloneState::SwitchingBaud);
            return self
                .start_hispeed_clone(cmd)
                .await
                .map_err(at_stage(STAGE_HISPEED));
        }
        let model = self.codec.encode_plain(&self.radio.model);
        self.send_frame(cmd, &model)
            .await
            .map_err(at_stage(STAGE_IDENTIFY))
    }

    async fn start_hispeed_clone(&mut self, cmd: u8) -> Result<()> {
        let mut payload = self.radio.model.to_vec();
        payload.extend_from_slice(&self.radio.hispeed_suffix);
        debug!("Starting hi-speed: {:02X?}", payload);
        let switch = serialize_padded(HISPEED_SWITCH_PAD, CMD_CLONE_HISPEED, &payload);
        self.send_raw(&switch).await?;
        self.drain_switch_response().await?;

        tracing::info!("Switching to {} baud", self.radio.hispeed_baud_rate);
        self.switch_baud(self.radio.hispeed_baud_rate).await?;
        self.hispeed_active = true;

        let mut start = self.radio.model[..3].to_vec();
        start.push(0x00);
        debug!("Starting hi-speed clone");
        let frame = serialize_padded(HISPEED_START_PAD, cmd, &start);
        self.send_raw(&frame).await
    }

    /// A link that cannot change speed fails the switch like any other
    /// transport error.
    async fn switch_baud(&mut self, baud_rate: u32) -> Result<()> {
        self.transport
            .set_baud_rate(baud_rate)
            .await
            .map_err(|e| match e {
                Error::Unsupported(msg) => {
                    Error::Transport(format!("cannot switch to {baud_rate} baud: {msg}"))
                }
                e => e,
            })
    }

    /// Read and discard whatever the radio says to the switch frame, up to
    /// a fixed amount. Silence is fine.
    async fn drain_switch_response(&mut self) -> Result<()> {
        let mut buf = [0u8; HISPEED_DRAIN];
        let mut total = 0;
        while total < HISPEED_DRAIN {
            match self
                .transport
                .receive(&mut buf[total..], self.config.read_timeout)
                .await
            {
                Ok(0) => return Err(Error::ConnectionLost),
                Ok(n) => total += n,
                Err(Error::Timeout) => break,
                Err(e) => return Err(e),
            }
        }
        debug!("Hi-speed switch response: {:02X?}", &buf[..total]);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Plumbing
    // ---------------------------------------------------------------

    async fn send_frame(&mut self, cmd: u8, payload: &[u8]) -> Result<()> {
        let bytes = serialize(cmd, payload);
        debug!("Sending: {}", IcfFrame::to_radio(cmd, payload));
        self.send_raw(&bytes).await
    }

    /// Write bytes to the radio, copying them to the capture sink first.
    async fn send_raw(&mut self, bytes: &[u8]) -> Result<()> {
        if let Some(sink) = self.capture.as_mut() {
            if let Err(e) = sink.write_all(bytes) {
                tracing::warn!("Failed to write clone capture: {e}");
            }
        }
        self.transport.send(bytes).await
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            tracing::info!("Clone cancelled");
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        if self.state != CloneState::Idle {
            return Err(Error::Protocol(format!(
                "clone session already used (state {:?})",
                self.state
            )));
        }
        Ok(())
    }

    fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.set_state(CloneState::Done),
            Err(e) => {
                tracing::error!("Clone failed: {e}");
                self.set_state(CloneState::Failed);
            }
        }
        result
    }

    fn set_state(&mut self, state: CloneState) {
        if self.state != state {
            debug!("Clone state {:?} -> {:?}", self.state, state);
            self.state = state;
            let _ = self.event_tx.send(CloneEvent::StateChanged(state));
        }
    }

    fn emit_progress(&self, direction: Direction, current: usize) {
        let _ = self.event_tx.send(CloneEvent::Progress {
            direction,
            current,
            total: self.radio.memsize,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::CloneBuilder;
    use clonelib_core::CloneRange;
    use clonelib_test_harness::MockTransport;

    fn tiny_radio() -> RadioDescriptor {
        RadioDescriptor::new(
            "TINY",
            [0x11, 0x22, 0x00, 0x01],
            32,
            b"Icom Inc.00",
            vec![CloneRange::new(0, 32, 16)],
        )
    }

    fn radio_frame(cmd: u8, payload: &[u8]) -> Vec<u8> {
        IcfFrame::from_radio(cmd, payload.to_vec()).pack()
    }

    fn probe() -> Vec<u8> {
        serialize(CMD_CLONE_ID, &[0, 0, 0, 0])
    }

    async fn session(radio: &RadioDescriptor, mock: MockTransport) -> CloneSession<'_> {
        CloneBuilder::new(radio)
            .config(CloneConfig::immediate())
            .build_with_transport(Box::new(mock))
            .await
            .unwrap()
    }

    #[test]
    fn at_stage_rewraps_link_failures_only() {
        let e = at_stage("identify")(Error::Timeout);
        assert_eq!(e.to_string(), "transport error: identify: timeout waiting for response");

        let e = at_stage("data transfer")(Error::Transport("port gone".into()));
        assert!(matches!(e, Error::Transport(ref m) if m == "data transfer: port gone"));

        let e = at_stage("data transfer")(Error::TruncatedEscape);
        assert!(matches!(e, Error::TruncatedEscape));
    }

    #[tokio::test]
    async fn identify_without_reply_is_transport_error() {
        let radio = tiny_radio();
        let mut mock = MockTransport::new();
        mock.expect_silent(&probe());
        let mut session = session(&radio, mock).await;

        match session.clone_from_radio().await {
            Err(Error::Transport(msg)) => assert!(msg.starts_with("identify:"), "{msg}"),
            other => panic!("expected Transport, got {other:?}"),
        }
        assert_eq!(session.state(), CloneState::Failed);
    }

    #[tokio::test]
    async fn identify_with_two_replies_is_protocol_error() {
        let radio = tiny_radio();
        let mut mock = MockTransport::new();
        let mut reply = radio_frame(0xE1, &radio.model);
        reply.extend(radio_frame(0xE1, &radio.model));
        mock.expect(&probe(), &reply);
        let mut session = session(&radio, mock).await;

        assert!(matches!(
            session.clone_from_radio().await,
            Err(Error::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn session_is_single_use() {
        let radio = tiny_radio();
        let mut mock = MockTransport::new();
        mock.expect(&probe(), &radio_frame(0xE1, &[0x99, 0x99, 0x00, 0x01]));
        let mut session = session(&radio, mock).await;

        assert!(session.clone_from_radio().await.is_err());
        match session.clone_from_radio().await {
            Err(Error::Protocol(msg)) => assert!(msg.contains("already used")),
            other => panic!("expected Protocol, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let radio = tiny_radio();
        let mut mock = MockTransport::new();
        mock.expect(&probe(), &radio_frame(0xE1, &radio.model));
        let token = CancellationToken::new();
        token.cancel();
        let mut session = CloneBuilder::new(&radio)
            .config(CloneConfig::immediate())
            .cancel_token(token)
            .build_with_transport(Box::new(mock))
            .await
            .unwrap();

        assert!(matches!(
            session.clone_from_radio().await,
            Err(Error::Cancelled)
        ));
        assert_eq!(session.state(), CloneState::Failed);
    }

    #[tokio::test]
    async fn write_rejects_wrong_image_size() {
        let radio = tiny_radio();
        let mut session = session(&radio, MockTransport::new()).await;
        let result = session.clone_to_radio(&MemoryMap::new(31)).await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
        assert_eq!(session.state(), CloneState::Failed);
    }

    #[tokio::test]
    async fn revision_mismatch_blocks_write() {
        let radio = tiny_radio().with_map_revision(1);
        let mut reply = vec![0x11, 0x22, 0x00, 0x01, 0x00, 0x02];
        reply.resize(35, 0x20);
        reply.extend_from_slice(b"04D2050CFF0042");
        let mut mock = MockTransport::new();
        mock.expect(&probe(), &radio_frame(0xE1, &reply));
        let mut session = session(&radio, mock).await;

        match session.clone_to_radio(&MemoryMap::new(32)).await {
            Err(Error::RevisionMismatch { radio, image }) => {
                assert_eq!((radio, image), (2, 1));
            }
            other => panic!("expected RevisionMismatch, got {other:?}"),
        }
        assert_eq!(session.model_info().and_then(|m| m.revision), Some(2));
    }

    #[tokio::test]
    async fn unnamed_image_revision_defaults_to_one() {
        let radio = tiny_radio();
        let mut reply = vec![0x11, 0x22, 0x00, 0x01, 0x00, 0x02];
        reply.resize(35, 0x20);
        reply.extend_from_slice(b"04D2050CFF0042");
        let mut mock = MockTransport::new();
        mock.expect(&probe(), &radio_frame(0xE1, &reply));
        let mut session = session(&radio, mock).await;

        assert!(matches!(
            session.clone_to_radio(&MemoryMap::new(32)).await,
            Err(Error::RevisionMismatch { radio: 2, image: 1 })
        ));
    }

    #[tokio::test]
    async fn hung_up_link_stops_switch_drain() {
        let radio = tiny_radio();
        let mut mock = MockTransport::new();
        mock.set_hung_up(true);
        let mut session = session(&radio, mock).await;

        assert!(matches!(
            session.drain_switch_response().await,
            Err(Error::ConnectionLost)
        ));
    }

    #[tokio::test]
    async fn write_resets_stale_baud_rate() {
        let radio = tiny_radio();
        let mut mock = MockTransport::new();
        mock.set_baud_rate(38_400).await.unwrap();
        mock.expect_silent(&probe());
        let mut session = session(&radio, mock).await;
        assert!(session.clone_to_radio(&MemoryMap::new(32)).await.is_err());
        let transport = session.into_transport();
        assert_eq!(transport.baud_rate(), Some(9600));
    }

    #[tokio::test]
    async fn capture_sink_failures_are_not_fatal() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk full"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Err(std::io::Error::other("disk full"))
            }
        }

        let radio = tiny_radio();
        let mut mock = MockTransport::new();
        mock.expect(&probe(), &radio_frame(0xE1, &[0x99, 0x99, 0x00, 0x01]));
        let mut session = CloneBuilder::new(&radio)
            .config(CloneConfig::immediate())
            .capture(Box::new(Broken))
            .build_with_transport(Box::new(mock))
            .await
            .unwrap();

        // Fails on the model check, not on the capture write.
        assert!(matches!(
            session.clone_from_radio().await,
            Err(Error::ModelMismatch { .. })
        ));
    }
}
