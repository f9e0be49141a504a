//! Payload encodings for clone-mode frames.
//!
//! Older radios carry data blocks as BCD-ASCII: every byte becomes two
//! uppercase hex characters, so the payload can never contain a framing
//! byte. Newer radios (ID-4100, ID-5100) send raw bytes and
//! escape the few values that would collide with framing:
//!
//! ```text
//! byte > 0xF9  ->  0xFF, byte & 0x0F
//! ```
//!
//! Data blocks additionally carry an 8-bit checksum computed over the
//! unencoded bytes before encoding.

use clonelib_core::{Error, RadioDescriptor, Result};

/// Escape introducer in raw payloads.
pub const ESCAPE: u8 = 0xFF;

/// Largest byte value sent unescaped in raw payloads.
pub const MAX_UNESCAPED: u8 = 0xF9;

/// How a radio encodes frame payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadCodec {
    /// Two ASCII hex characters per byte.
    Encoded,
    /// Raw bytes with `0xFA..=0xFF` escaped.
    Raw,
}

impl PayloadCodec {
    /// Pick the codec a radio uses.
    pub fn for_radio(radio: &RadioDescriptor) -> Self {
        if radio.uses_raw_frames() {
            PayloadCodec::Raw
        } else {
            PayloadCodec::Encoded
        }
    }

    /// Encode a data-block payload, appending the checksum first when
    /// `with_checksum` is set.
    ///
    /// ```
    /// use clonelib_icom::payload::PayloadCodec;
    ///
    /// assert_eq!(PayloadCodec::Encoded.encode(&[0x01, 0xAB], false), b"01AB");
    /// assert_eq!(PayloadCodec::Raw.encode(&[0x01, 0xFD], false), vec![0x01, 0xFF, 0x0D]);
    /// ```
    pub fn encode(self, data: &[u8], with_checksum: bool) -> Vec<u8> {
        let sum = with_checksum.then(|| checksum(data));
        let bytes = data.iter().copied().chain(sum);
        match self {
            PayloadCodec::Encoded => {
                let mut out = Vec::with_capacity((data.len() + 1) * 2);
                for b in bytes {
                    out.extend_from_slice(&hex_pair(b));
                }
                out
            }
            PayloadCodec::Raw => {
                let mut out = Vec::with_capacity(data.len() + 1);
                for b in bytes {
                    escape_raw_byte(b, &mut out);
                }
                out
            }
        }
    }

    /// Encode a control-frame payload (identify probe, model id, end-frame
    /// marker).
    ///
    /// These travel verbatim on encoded radios. Raw radios escape every
    /// payload, control frames included.
    pub fn encode_plain(self, data: &[u8]) -> Vec<u8> {
        match self {
            PayloadCodec::Encoded => data.to_vec(),
            PayloadCodec::Raw => self.encode(data, false),
        }
    }

    /// Decode a received data-block payload.
    pub fn decode(self, payload: &[u8]) -> Result<Vec<u8>> {
        match self {
            PayloadCodec::Encoded => decode_hex(payload),
            PayloadCodec::Raw => unescape_raw_bytes(payload),
        }
    }
}

/// Additive checksum used on data blocks.
///
/// Adding the checksum to the byte sum of `data` gives zero modulo 256.
///
/// ```
/// use clonelib_icom::payload::checksum;
///
/// assert_eq!(checksum(&[]), 0x00);
/// assert_eq!(checksum(&[0x01]), 0xFF);
/// assert_eq!(checksum(&[0x00, 0x20, 0x10]), 0xD0);
/// ```
pub fn checksum(data: &[u8]) -> u8 {
    let sum = data.iter().fold(0u32, |acc, &b| acc.wrapping_add(u32::from(b)));
    ((sum ^ 0xFFFF).wrapping_add(1) & 0xFF) as u8
}

/// Append `byte` to `out`, escaped for a raw payload.
pub fn escape_raw_byte(byte: u8, out: &mut Vec<u8>) {
    if byte > MAX_UNESCAPED {
        out.push(ESCAPE);
        out.push(byte & 0x0F);
    } else {
        out.push(byte);
    }
}

/// Reverse [`escape_raw_byte`] over a whole payload.
///
/// A trailing escape byte with nothing after it is
/// [`Error::TruncatedEscape`].
pub fn unescape_raw_bytes(escaped: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(escaped.len());
    let mut iter = escaped.iter();
    while let Some(&b) = iter.next() {
        if b == ESCAPE {
            let &low = iter.next().ok_or(Error::TruncatedEscape)?;
            out.push(0xF0 | low);
        } else {
            out.push(b);
        }
    }
    Ok(out)
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

fn hex_pair(byte: u8) -> [u8; 2] {
    [
        HEX_DIGITS[usize::from(byte >> 4)],
        HEX_DIGITS[usize::from(byte & 0x0F)],
    ]
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

fn decode_hex(payload: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(payload.len() / 2);
    for (i, pair) in payload.chunks(2).enumerate() {
        let offset = i * 2;
        let [hi, lo] = pair else {
            return Err(Error::MalformedPayload { offset });
        };
        match (hex_value(*hi), hex_value(*lo)) {
            (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
            _ => {
                tracing::error!("Failed to parse byte {offset} ({:02X?})", pair);
                return Err(Error::MalformedPayload { offset });
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clonelib_core::CloneRange;

    fn sample(len: usize, seed: u8) -> Vec<u8> {
        (0..len)
            .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
            .collect()
    }

    // ---------------------------------------------------------------
    // Checksum
    // ---------------------------------------------------------------

    #[test]
    fn checksum_zeroes_the_sum() {
        for len in [0usize, 1, 2, 35, 67, 300] {
            let data = sample(len, 3);
            let sum = data.iter().fold(0u8, |a, &b| a.wrapping_add(b));
            assert_eq!(sum.wrapping_add(checksum(&data)), 0, "len {len}");
        }
    }

    #[test]
    fn checksum_detects_every_single_bit_flip() {
        let data = sample(35, 0x5A);
        let good = checksum(&data);
        for i in 0..data.len() {
            for bit in 0..8 {
                let mut flipped = data.clone();
                flipped[i] ^= 1 << bit;
                assert_ne!(checksum(&flipped), good, "byte {i} bit {bit}");
            }
        }
    }

    // ---------------------------------------------------------------
    // Encoded (BCD-ASCII)
    // ---------------------------------------------------------------

    #[test]
    fn encoded_is_uppercase_hex() {
        assert_eq!(
            PayloadCodec::Encoded.encode(&[0x00, 0x9F, 0xFD, 0xAB], false),
            b"009FFDAB".to_vec()
        );
    }

    #[test]
    fn encoded_checksum_is_appended_before_encoding() {
        let out = PayloadCodec::Encoded.encode(&[0x00, 0x20, 0x10], true);
        assert_eq!(out, b"002010D0".to_vec());
    }

    #[test]
    fn encoded_round_trip_all_lengths() {
        for len in 0..=256 {
            let data = sample(len, 0xC3);
            let wire = PayloadCodec::Encoded.encode(&data, false);
            assert_eq!(wire.len(), len * 2);
            assert!(!wire.contains(&0xFD));
            assert_eq!(PayloadCodec::Encoded.decode(&wire).unwrap(), data);
        }
    }

    #[test]
    fn encoded_accepts_lowercase() {
        assert_eq!(
            PayloadCodec::Encoded.decode(b"abCD").unwrap(),
            vec![0xAB, 0xCD]
        );
    }

    #[test]
    fn encoded_non_hex_pair_is_malformed() {
        match PayloadCodec::Encoded.decode(b"0011ZZ22") {
            Err(Error::MalformedPayload { offset }) => assert_eq!(offset, 4),
            other => panic!("expected MalformedPayload, got {other:?}"),
        }
    }

    #[test]
    fn encoded_odd_length_is_malformed() {
        match PayloadCodec::Encoded.decode(b"00112") {
            Err(Error::MalformedPayload { offset }) => assert_eq!(offset, 4),
            other => panic!("expected MalformedPayload, got {other:?}"),
        }
    }

    #[test]
    fn encoded_plain_is_verbatim() {
        assert_eq!(
            PayloadCodec::Encoded.encode_plain(b"Icom Inc.68"),
            b"Icom Inc.68".to_vec()
        );
    }

    // ---------------------------------------------------------------
    // Raw (escaped)
    // ---------------------------------------------------------------

    #[test]
    fn raw_escapes_high_values() {
        let mut out = Vec::new();
        for b in 0xF8..=0xFF {
            escape_raw_byte(b, &mut out);
        }
        assert_eq!(
            out,
            vec![
                0xF8, 0xF9, 0xFF, 0x0A, 0xFF, 0x0B, 0xFF, 0x0C, 0xFF, 0x0D, 0xFF, 0x0E, 0xFF,
                0x0F
            ]
        );
    }

    #[test]
    fn raw_round_trip_with_escapes() {
        for len in 0..=256 {
            let data: Vec<u8> = (0..len)
                .map(|i| if i % 3 == 0 { 0xFA + (i % 6) as u8 } else { i as u8 })
                .collect();
            let wire = PayloadCodec::Raw.encode(&data, false);
            assert!(!wire.contains(&0xFD), "literal terminator at len {len}");
            let mut iter = wire.iter();
            while let Some(&b) = iter.next() {
                if b == ESCAPE {
                    let low = *iter.next().unwrap();
                    assert!(low <= 0x0F);
                } else {
                    assert!(b <= MAX_UNESCAPED, "unescaped {b:02X}");
                }
            }
            assert_eq!(PayloadCodec::Raw.decode(&wire).unwrap(), data);
        }
    }

    #[test]
    fn raw_checksum_is_escaped_too() {
        // Sum 0x01 -> checksum 0xFF, which must be escaped.
        assert_eq!(
            PayloadCodec::Raw.encode(&[0x01], true),
            vec![0x01, 0xFF, 0x0F]
        );
    }

    #[test]
    fn raw_trailing_escape_is_truncated() {
        assert!(matches!(
            unescape_raw_bytes(&[0x01, 0x02, 0xFF]),
            Err(Error::TruncatedEscape)
        ));
        assert!(matches!(
            PayloadCodec::Raw.decode(&[0xFF]),
            Err(Error::TruncatedEscape)
        ));
    }

    #[test]
    fn raw_plain_still_escapes() {
        assert_eq!(
            PayloadCodec::Raw.encode_plain(&[0x35, 0x98, 0xFE, 0x01]),
            vec![0x35, 0x98, 0xFF, 0x0E, 0x01]
        );
    }

    #[test]
    fn codec_follows_descriptor() {
        let radio = RadioDescriptor::new(
            "TEST",
            [0x35, 0x98, 0x00, 0x01],
            64,
            b"",
            vec![CloneRange::new(0, 64, 16)],
        );
        assert_eq!(PayloadCodec::for_radio(&radio), PayloadCodec::Encoded);
        assert_eq!(
            PayloadCodec::for_radio(&radio.with_raw_frames()),
            PayloadCodec::Raw
        );
    }
}
