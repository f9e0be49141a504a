//! Data-block layout inside `CMD_CLONE_DAT` frames.
//!
//! After the payload has been decoded, a data block reads:
//!
//! ```text
//! addr (2 bytes BE, or 4 when the image is >= 64 KiB) | len | data[len] | checksum
//! ```
//!
//! The checksum covers the address bytes, the length byte, and the data.

use bytes::{BufMut, BytesMut};
use clonelib_core::{Error, Result};

use crate::payload::checksum;

/// One data block carried by a `CMD_CLONE_DAT` frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataBlock {
    /// Start address in the memory image.
    pub addr: usize,
    /// Block contents.
    pub data: Vec<u8>,
    /// Checksum byte as sent.
    pub checksum: u8,
    /// Width of the address field on the wire.
    wide: bool,
}

impl DataBlock {
    /// Parse a decoded data-block payload.
    ///
    /// `wide` selects 4-byte addresses. The payload must hold exactly the
    /// header, `len` data bytes, and one checksum byte.
    pub fn parse(decoded: &[u8], wide: bool) -> Result<DataBlock> {
        let addr_len = addr_width(wide);
        if decoded.len() < addr_len + 2 {
            return Err(Error::Protocol(format!(
                "data block too short ({} bytes)",
                decoded.len()
            )));
        }

        let addr = decoded[..addr_len]
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        let len = usize::from(decoded[addr_len]);
        let data_start = addr_len + 1;
        let expected = data_start + len + 1;
        if decoded.len() != expected {
            return Err(Error::Protocol(format!(
                "data block at 0x{addr:04X} claims {len} bytes but carries {}",
                decoded.len().saturating_sub(data_start + 1)
            )));
        }

        Ok(DataBlock {
            addr,
            data: decoded[data_start..data_start + len].to_vec(),
            checksum: decoded[expected - 1],
            wide,
        })
    }

    /// One past the last address this block covers.
    pub fn end(&self) -> usize {
        self.addr + self.data.len()
    }

    /// Check the trailing checksum against the header and data.
    pub fn verify(&self) -> Result<()> {
        let calculated = checksum(&encode_chunk(self.addr, &self.data, self.wide));
        if calculated != self.checksum {
            tracing::error!(
                "Bad checksum in address {:04X} frame: {:02X} calculated, {:02X} sent",
                self.addr,
                calculated,
                self.checksum
            );
            return Err(Error::Checksum {
                addr: self.addr,
                expected: calculated,
                found: self.checksum,
            });
        }
        Ok(())
    }
}

fn addr_width(wide: bool) -> usize {
    if wide { 4 } else { 2 }
}

/// Build the address and length header of a data block.
pub fn encode_block_header(addr: usize, len: u8, wide: bool) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(addr_width(wide) + 1);
    if wide {
        buf.put_u32(addr as u32);
    } else {
        buf.put_u16(addr as u16);
    }
    buf.put_u8(len);
    buf.to_vec()
}

/// Build an unencoded data block (header plus data, no checksum).
///
/// `data` must be at most 255 bytes; descriptor validation guarantees this
/// for every block the write path produces.
pub fn encode_chunk(addr: usize, data: &[u8], wide: bool) -> Vec<u8> {
    let mut chunk = encode_block_header(addr, data.len() as u8, wide);
    chunk.extend_from_slice(data);
    chunk
}
