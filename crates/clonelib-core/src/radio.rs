//! Radio descriptors: the transport-relevant facts about one radio model.
//!
//! A [`RadioDescriptor`] is supplied by a radio driver and borrowed
//! read-only by a clone session. It carries everything the clone protocol
//! needs (model id, image size, the address ranges to send and their block
//! sizes, the end-of-clone marker, link speeds, payload encoding) and
//! nothing about what the image bytes mean.

use crate::error::{Error, Result};

/// Images at or above this size use 4-byte block addresses on the wire.
pub const WIDE_ADDRESS_THRESHOLD: usize = 0x10000;

/// Largest block the one-byte length field of a data frame can describe.
pub const MAX_BLOCK_SIZE: usize = 0xFF;

/// Default link speed for clone mode.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Link speed after the hi-speed switch.
pub const DEFAULT_HISPEED_BAUD_RATE: u32 = 38_400;

/// Tail of the hi-speed switch frame, after the model id.
pub const DEFAULT_HISPEED_SUFFIX: [u8; 5] = [0x00, 0x00, 0x02, 0x01, 0xFD];

/// Memory map revision assumed for images that do not name one.
pub const DEFAULT_MAP_REVISION: u8 = 1;

/// One contiguous region of the image sent during a write clone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloneRange {
    /// First address of the range.
    pub start: usize,
    /// One past the last address of the range.
    pub end: usize,
    /// Bytes per data frame; the final frame of a range may be shorter.
    pub block_size: usize,
}

impl CloneRange {
    /// Create a range covering `start..end` sent in `block_size` chunks.
    pub const fn new(start: usize, end: usize, block_size: usize) -> Self {
        CloneRange {
            start,
            end,
            block_size,
        }
    }
}

/// Static clone-mode parameters for one Icom radio model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadioDescriptor {
    /// Human-readable model name (e.g. "IC-2820H").
    pub name: &'static str,
    /// Four-byte model id the radio returns from the identify probe.
    pub model: [u8; 4],
    /// Image size in bytes.
    pub memsize: usize,
    /// Model-specific payload of the clone-end frame.
    pub endframe: Vec<u8>,
    /// Regions sent during a write clone, in order.
    pub ranges: Vec<CloneRange>,
    /// Whether the radio can switch to the hi-speed link during a clone.
    pub supports_hispeed: bool,
    /// Whether data frames use the escaped raw encoding instead of BCD-ASCII.
    pub raw_frames: bool,
    /// Link speed a clone starts at.
    pub baud_rate: u32,
    /// Link speed after the hi-speed switch.
    pub hispeed_baud_rate: u32,
    /// Bytes following the model id in the hi-speed switch frame.
    pub hispeed_suffix: Vec<u8>,
    /// Whether the radio must be identified twice before a write clone.
    pub double_ident: bool,
    /// Whether the image is stored with bit 7 of each byte inverted.
    pub highbit_flip: bool,
    /// Memory map revision the image layout was built for.
    ///
    /// `None` means [`DEFAULT_MAP_REVISION`]; see
    /// [`image_revision`](Self::image_revision).
    pub map_revision: Option<u8>,
}

impl RadioDescriptor {
    /// Create a descriptor with the common defaults: 9600 baud start,
    /// BCD-ASCII payloads, no hi-speed, single identify.
    pub fn new(
        name: &'static str,
        model: [u8; 4],
        memsize: usize,
        endframe: &[u8],
        ranges: Vec<CloneRange>,
    ) -> Self {
        RadioDescriptor {
            name,
            model,
            memsize,
            endframe: endframe.to_vec(),
            ranges,
            supports_hispeed: false,
            raw_frames: false,
            baud_rate: DEFAULT_BAUD_RATE,
            hispeed_baud_rate: DEFAULT_HISPEED_BAUD_RATE,
            hispeed_suffix: DEFAULT_HISPEED_SUFFIX.to_vec(),
            double_ident: false,
            highbit_flip: false,
            map_revision: None,
        }
    }

    /// Mark the radio as hi-speed capable.
    pub fn with_hispeed(mut self) -> Self {
        self.supports_hispeed = true;
        self
    }

    /// Use the escaped raw payload encoding.
    pub fn with_raw_frames(mut self) -> Self {
        self.raw_frames = true;
        self
    }

    /// Store the image high-bit-flipped.
    pub fn with_highbit_flip(mut self) -> Self {
        self.highbit_flip = true;
        self
    }

    /// Identify twice before a write clone.
    pub fn with_double_ident(mut self) -> Self {
        self.double_ident = true;
        self
    }

    /// Require the radio to report this memory map revision before writing.
    pub fn with_map_revision(mut self, revision: u8) -> Self {
        self.map_revision = Some(revision);
        self
    }

    /// The four-byte model id.
    pub fn get_model(&self) -> [u8; 4] {
        self.model
    }

    /// Image size in bytes.
    pub fn get_memsize(&self) -> usize {
        self.memsize
    }

    /// Payload of the clone-end frame.
    pub fn get_endframe(&self) -> &[u8] {
        &self.endframe
    }

    /// Regions sent during a write clone.
    pub fn get_ranges(&self) -> &[CloneRange] {
        &self.ranges
    }

    /// Whether the radio supports the hi-speed switch.
    pub fn is_hispeed(&self) -> bool {
        self.supports_hispeed
    }

    /// Whether data frames use the escaped raw encoding.
    pub fn uses_raw_frames(&self) -> bool {
        self.raw_frames
    }

    /// Revision a radio must report before an image is written to it.
    pub fn image_revision(&self) -> u8 {
        self.map_revision.unwrap_or(DEFAULT_MAP_REVISION)
    }

    /// Whether block addresses are 4 bytes wide on the wire.
    pub fn is_wide_address(&self) -> bool {
        self.memsize >= WIDE_ADDRESS_THRESHOLD
    }

    /// Check the descriptor for values the wire format cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.memsize == 0 {
            return Err(Error::InvalidParameter(format!(
                "{}: memory size must be non-zero",
                self.name
            )));
        }
        for range in &self.ranges {
            if range.start > range.end || range.end > self.memsize {
                return Err(Error::InvalidParameter(format!(
                    "{}: range 0x{:05X}-0x{:05X} outside image of 0x{:05X} bytes",
                    self.name, range.start, range.end, self.memsize
                )));
            }
            if range.block_size == 0 || range.block_size > MAX_BLOCK_SIZE {
                return Err(Error::InvalidParameter(format!(
                    "{}: block size {} must be between 1 and {MAX_BLOCK_SIZE}",
                    self.name, range.block_size
                )));
            }
        }
        Ok(())
    }
}
