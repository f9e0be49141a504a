//! The memory map: a radio's whole EEPROM/flash image as a flat buffer.
//!
//! A [`MemoryMap`] is the sole data product of a clone. Reading from a radio
//! starts with a zero-filled map of the descriptor's size and overlays each
//! received data block at its address; writing to a radio walks an existing
//! map range by range. Every access is bounds-checked and fails with
//! [`Error::OutOfBounds`] rather than being truncated or dropped.

use crate::error::{Error, Result};

/// A fixed-size, bounds-checked radio memory image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMap {
    bytes: Vec<u8>,
}

impl MemoryMap {
    /// Create a zero-filled map of `size` bytes.
    pub fn new(size: usize) -> Self {
        MemoryMap {
            bytes: vec![0u8; size],
        }
    }

    /// Wrap an existing image, e.g. one loaded from disk for a write clone.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        MemoryMap { bytes }
    }

    /// Size of the image in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the image has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Copy `data` into the image at `addr`.
    ///
    /// Overlapping writes simply overwrite earlier contents, so blocks
    /// applied in receipt order are last-write-wins.
    pub fn write(&mut self, addr: usize, data: &[u8]) -> Result<()> {
        let end = self.checked_end(addr, data.len())?;
        self.bytes[addr..end].copy_from_slice(data);
        Ok(())
    }

    /// Borrow `len` bytes of the image starting at `addr`.
    pub fn read(&self, addr: usize, len: usize) -> Result<&[u8]> {
        let end = self.checked_end(addr, len)?;
        Ok(&self.bytes[addr..end])
    }

    /// Borrow the whole image.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the map and hand the image to the caller.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Return a copy with bit 7 of every byte inverted.
    ///
    /// Some radios (ID-4100, ID-5100) store their image with the high-order
    /// bit flipped relative to what goes over the wire. Applying this twice
    /// gives back the original image.
    pub fn flip_high_bits(&self) -> MemoryMap {
        MemoryMap {
            bytes: self.bytes.iter().map(|b| b ^ 0x80).collect(),
        }
    }

    fn checked_end(&self, addr: usize, len: usize) -> Result<usize> {
        match addr.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(end),
            _ => Err(Error::OutOfBounds {
                addr,
                len,
                size: self.bytes.len(),
            }),
        }
    }
}

impl From<Vec<u8>> for MemoryMap {
    fn from(bytes: Vec<u8>) -> Self {
        MemoryMap::from_bytes(bytes)
    }
}

impl AsRef<[u8]> for MemoryMap {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
