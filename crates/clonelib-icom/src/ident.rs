//! Decoding of the radio's identify reply.
//!
//! Every radio answers the identify probe with its four-byte model id.
//! Newer radios append more: a 49-byte reply also carries the memory map
//! revision, a free-text comment, and the unit's serial number.

use std::fmt;

/// Length of the extended identify reply.
pub const EXTENDED_MODEL_DATA_LEN: usize = 49;

/// What the radio told us about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// The model id (first four bytes of the reply, fewer if it was short).
    pub model: Vec<u8>,
    /// Memory map revision.
    pub revision: Option<u8>,
    /// Free-text comment, as sent.
    pub comment: Option<Vec<u8>>,
    /// Serial number, formatted as twelve decimal digits.
    pub serial: Option<String>,
}

impl ModelInfo {
    /// Decode an identify reply payload.
    ///
    /// Only the model id is guaranteed; the other fields are `None` unless
    /// the reply is the extended 49-byte form and decodes cleanly.
    pub fn decode(data: &[u8]) -> ModelInfo {
        let model = data[..data.len().min(4)].to_vec();
        if data.len() != EXTENDED_MODEL_DATA_LEN {
            tracing::info!("Unable to decode {}-byte model data", data.len());
            return ModelInfo {
                model,
                revision: None,
                comment: None,
                serial: None,
            };
        }

        let Some(serial) = decode_serial(&data[35..49]) else {
            tracing::error!("Failed to decode model data");
            return ModelInfo {
                model,
                revision: None,
                comment: None,
                serial: None,
            };
        };

        let revision = data[5];
        let comment = data[6..22].to_vec();
        tracing::info!("Radio revision is {revision}");
        tracing::info!("Radio comment is {:?}", String::from_utf8_lossy(&comment));
        tracing::info!("Radio serial is {serial}");

        ModelInfo {
            model,
            revision: Some(revision),
            comment: Some(comment),
            serial: Some(serial),
        }
    }

    /// Returns `true` if the reply starts with `expected`.
    pub fn matches(&self, expected: &[u8; 4]) -> bool {
        self.model.as_slice() == expected
    }
}

impl fmt::Display for ModelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model {:02X?}", self.model)?;
        if let Some(rev) = self.revision {
            write!(f, " rev {rev}")?;
        }
        if let Some(serial) = &self.serial {
            write!(f, " serial {serial}")?;
        }
        Ok(())
    }
}

/// Decode 14 hex characters into the `model(u16) b1 b2 unused s3(u16)`
/// serial layout and format it as `%04d%02d%02d%04d`.
fn decode_serial(hex: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(hex).ok()?;
    let mut raw = [0u8; 7];
    for (i, slot) in raw.iter_mut().enumerate() {
        *slot = u8::from_str_radix(text.get(i * 2..i * 2 + 2)?, 16).ok()?;
    }
    let model = u16::from_be_bytes([raw[0], raw[1]]);
    let (b1, b2) = (raw[2], raw[3]);
    let s3 = u16::from_be_bytes([raw[5], raw[6]]);
    Some(format!("{model:04}{b1:02}{b2:02}{s3:04}"))
}
