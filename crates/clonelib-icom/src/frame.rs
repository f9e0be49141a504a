//! Clone-mode frame encoder/decoder.
//!
//! Icom clone mode reuses the CI-V framing on a point-to-point cable. This
//! module handles the pure byte-level encoding and decoding of those frames;
//! it knows nothing about payload encodings or the clone handshake.
//!
//! # Frame format
//!
//! ```text
//! 0xFE 0xFE <src> <dst> <cmd> [<payload>...] 0xFD
//! ```
//!
//! - Preamble: two `0xFE` bytes (hi-speed frames are preceded by a longer run)
//! - `src`: sender address, [`ADDR_PC`] or [`ADDR_RADIO`]
//! - `dst`: receiver address
//! - `cmd`: clone command byte
//! - `payload`: command-specific bytes, never containing `0xFD`
//! - Terminator: `0xFD`
//!
//! Note the address order is source first, the reverse of live CI-V.

use std::fmt;

use bytes::{BufMut, BytesMut};
use clonelib_core::{Error, Result};

/// Preamble byte repeated twice at the start of every frame.
pub const PREAMBLE: u8 = 0xFE;

/// Frame terminator byte.
pub const TERMINATOR: u8 = 0xFD;

/// Address of the computer end of the cable.
pub const ADDR_PC: u8 = 0xEE;

/// Address of the radio end of the cable.
pub const ADDR_RADIO: u8 = 0xEF;

/// Identify probe, sent by the PC.
pub const CMD_CLONE_ID: u8 = 0xE0;
/// Identify reply carrying the model data.
pub const CMD_CLONE_MODEL: u8 = 0xE1;
/// Start a radio-to-PC clone.
pub const CMD_CLONE_OUT: u8 = 0xE2;
/// Start a PC-to-radio clone.
pub const CMD_CLONE_IN: u8 = 0xE3;
/// One data block.
pub const CMD_CLONE_DAT: u8 = 0xE4;
/// End of clone, carrying the model's end-frame marker.
pub const CMD_CLONE_END: u8 = 0xE5;
/// Clone result reported by the radio after a PC-to-radio clone.
pub const CMD_CLONE_OK: u8 = 0xE6;
/// Switch the link to the hi-speed baud rate.
pub const CMD_CLONE_HISPEED: u8 = 0xE8;

/// Smallest possible frame: preamble, three header bytes, terminator.
pub const MIN_FRAME_LEN: usize = 6;

/// Header length (preamble plus `src dst cmd`).
const HEADER_LEN: usize = 5;

/// A parsed clone-mode frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcfFrame {
    /// Sender address.
    pub src: u8,
    /// Receiver address.
    pub dst: u8,
    /// Command byte.
    pub cmd: u8,
    /// Payload bytes as they appear on the wire (still encoded).
    pub payload: Vec<u8>,
}

impl IcfFrame {
    /// Create a frame from the PC to the radio.
    pub fn to_radio(cmd: u8, payload: impl Into<Vec<u8>>) -> Self {
        IcfFrame {
            src: ADDR_PC,
            dst: ADDR_RADIO,
            cmd,
            payload: payload.into(),
        }
    }

    /// Create a frame from the radio to the PC.
    pub fn from_radio(cmd: u8, payload: impl Into<Vec<u8>>) -> Self {
        IcfFrame {
            src: ADDR_RADIO,
            dst: ADDR_PC,
            cmd,
            payload: payload.into(),
        }
    }

    /// Returns `true` if this is one of our own frames looped back by an
    /// echoing cable.
    pub fn is_echo(&self) -> bool {
        self.src == ADDR_PC && self.dst == ADDR_RADIO
    }

    /// Encode this frame to wire bytes.
    pub fn pack(&self) -> Vec<u8> {
        encode_frame(self.src, self.dst, self.cmd, &self.payload)
    }
}

fn addr_name(addr: u8) -> &'static str {
    match addr {
        ADDR_PC => "PC",
        ADDR_RADIO => "Radio",
        _ => "??",
    }
}

/// Human-readable name of a clone command byte.
pub fn command_name(cmd: u8) -> &'static str {
    match cmd {
        CMD_CLONE_ID => "ID",
        CMD_CLONE_MODEL => "Model",
        CMD_CLONE_OUT => "Clone out",
        CMD_CLONE_IN => "Clone in",
        CMD_CLONE_DAT => "Clone data",
        CMD_CLONE_END => "Clone end",
        CMD_CLONE_OK => "Clone OK",
        CMD_CLONE_HISPEED => "Clone hispeed",
        _ => "??",
    }
}

impl fmt::Display for IcfFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{}]: {:02X?}",
            addr_name(self.src),
            addr_name(self.dst),
            command_name(self.cmd),
            self.payload
        )
    }
}

/// Encode a frame into raw bytes ready for transmission.
///
/// # Example
///
/// ```
/// use clonelib_icom::frame::{encode_frame, ADDR_PC, ADDR_RADIO, CMD_CLONE_ID};
///
/// let bytes = encode_frame(ADDR_PC, ADDR_RADIO, CMD_CLONE_ID, &[0, 0, 0, 0]);
/// assert_eq!(bytes, vec![0xFE, 0xFE, 0xEE, 0xEF, 0xE0, 0, 0, 0, 0, 0xFD]);
/// ```
pub fn encode_frame(src: u8, dst: u8, cmd: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(MIN_FRAME_LEN + payload.len());
    buf.put_u8(PREAMBLE);
    buf.put_u8(PREAMBLE);
    buf.put_u8(src);
    buf.put_u8(dst);
    buf.put_u8(cmd);
    buf.put_slice(payload);
    buf.put_u8(TERMINATOR);
    buf.to_vec()
}

/// Encode a PC-to-radio frame.
///
/// The payload must already be encoded for the radio.
pub fn serialize(cmd: u8, payload: &[u8]) -> Vec<u8> {
    encode_frame(ADDR_PC, ADDR_RADIO, cmd, payload)
}

/// Encode a PC-to-radio frame preceded by `pad` extra preamble bytes.
///
/// Radios listening at the wrong speed need a run of `0xFE` to lock on to
/// before the frame proper.
pub fn serialize_padded(pad: usize, cmd: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(pad + MIN_FRAME_LEN + payload.len());
    buf.put_bytes(PREAMBLE, pad);
    buf.put_slice(&serialize(cmd, payload));
    buf.to_vec()
}

/// Attempt to parse one frame from the start of `buf`.
///
/// Returns `(Some(frame), rest)` where `rest` is everything after the
/// frame's terminator, or `(None, buf)` when more data is needed. Echo
/// frames are returned like any other; filtering them is the caller's job.
///
/// Fails with [`Error::Desync`] when the buffer holds at least five bytes
/// but does not start with the preamble, or when a terminator appears
/// before the `src dst cmd` header is complete.
///
/// # Example
///
/// ```
/// use clonelib_icom::frame::{parse_next, CMD_CLONE_END};
///
/// let buf = [0xFE, 0xFE, 0xEF, 0xEE, 0xE5, 0xFD, 0xFE];
/// let (frame, rest) = parse_next(&buf).unwrap();
/// assert_eq!(frame.unwrap().cmd, CMD_CLONE_END);
/// assert_eq!(rest, &[0xFE]);
/// ```
pub fn parse_next(buf: &[u8]) -> Result<(Option<IcfFrame>, &[u8])> {
    if !buf.starts_with(&[PREAMBLE, PREAMBLE]) {
        if buf.len() < HEADER_LEN {
            return Ok((None, buf));
        }
        return Err(Error::Desync(format!(
            "expected preamble, got {:02X?}",
            &buf[..buf.len().min(16)]
        )));
    }

    let Some(end) = buf.iter().position(|&b| b == TERMINATOR) else {
        return Ok((None, buf));
    };
    if end < HEADER_LEN {
        return Err(Error::Desync(format!(
            "truncated frame header {:02X?}",
            &buf[..=end]
        )));
    }

    let frame = IcfFrame {
        src: buf[2],
        dst: buf[3],
        cmd: buf[4],
        payload: buf[HEADER_LEN..end].to_vec(),
    };
    Ok((Some(frame), &buf[end + 1..]))
}
