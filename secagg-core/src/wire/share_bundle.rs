//! Serialized Shamir shares.
//!
//! Two encodings live here:
//!
//! - the single-share record sealed into an AEAD blob on the pairwise path:
//!   4-byte big-endian index ‖ 16-byte big-endian value;
//! - the simplified-path bundle submitted alongside a masked update:
//!   4-byte share count, then per share a 4-byte index, a 4-byte value
//!   length, the 16-byte zero-padded value and the 8-byte truncated field
//!   modulus. The modulus truncation to 8 bytes is lossy for the 127-bit
//!   field but is what the paired server parses, so it is preserved
//!   exactly; decoding never reads the modulus back.
//!
//! See the [wire module] documentation since this is a private module
//! anyways.
//!
//! [wire module]: crate::wire

use std::convert::TryInto;

use anyhow::anyhow;

use crate::{field, shamir::Share, wire::DecodeError};

const COUNT_LENGTH: usize = 4;
const INDEX_LENGTH: usize = 4;
const VALUE_LENGTH_FIELD: usize = 4;
const VALUE_LENGTH: usize = field::ELEMENT_LENGTH;
const MODULUS_LENGTH: usize = 8;

/// Length in bytes of one encoded share record inside a bundle.
const BUNDLE_RECORD_LENGTH: usize =
    INDEX_LENGTH + VALUE_LENGTH_FIELD + VALUE_LENGTH + MODULUS_LENGTH;

/// Length in bytes of the single-share record sealed on the pairwise path.
pub const SHARE_RECORD_LENGTH: usize = INDEX_LENGTH + VALUE_LENGTH;

/// Encodes one share as index ‖ value for sealing into an AEAD blob.
pub fn encode_share(share: &Share) -> [u8; SHARE_RECORD_LENGTH] {
    let mut record = [0_u8; SHARE_RECORD_LENGTH];
    record[..INDEX_LENGTH].copy_from_slice(&share.index.to_be_bytes());
    record[INDEX_LENGTH..].copy_from_slice(&field::element_to_bytes(&share.value));
    record
}

/// Decodes a share record produced by [`encode_share`].
pub fn decode_share(record: &[u8]) -> Result<Share, DecodeError> {
    if record.len() != SHARE_RECORD_LENGTH {
        return Err(anyhow!(
            "invalid share record length: {} != {}",
            record.len(),
            SHARE_RECORD_LENGTH
        ));
    }
    // safe unwraps: the lengths are guaranteed by the check above
    let index = u32::from_be_bytes(record[..INDEX_LENGTH].try_into().unwrap());
    if index == 0 {
        return Err(anyhow!("invalid share record: zero index"));
    }
    let value = field::element_from_bytes(record[INDEX_LENGTH..].try_into().unwrap());
    Ok(Share { index, value })
}

#[derive(Clone, Debug, Eq, PartialEq)]
/// The per-participant shares submitted on the simplified path.
pub struct ShareBundle {
    pub shares: Vec<Share>,
}

impl ShareBundle {
    /// Serializes the bundle into the server's framing.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(COUNT_LENGTH + self.shares.len() * BUNDLE_RECORD_LENGTH);
        bytes.extend_from_slice(&(self.shares.len() as u32).to_be_bytes());
        let modulus_tail = truncated_modulus();
        for share in &self.shares {
            bytes.extend_from_slice(&share.index.to_be_bytes());
            bytes.extend_from_slice(&(VALUE_LENGTH as u32).to_be_bytes());
            bytes.extend_from_slice(&field::element_to_bytes(&share.value));
            bytes.extend_from_slice(&modulus_tail);
        }
        bytes
    }

    /// Deserializes a bundle.
    ///
    /// # Errors
    /// Fails if the buffer is shorter than the announced share count
    /// requires, a value length differs from 16, or an index is zero. The
    /// truncated modulus bytes are skipped, not validated: they cannot
    /// represent the field modulus anyway.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < COUNT_LENGTH {
            return Err(anyhow!("share bundle too short for the count field"));
        }
        // safe unwrap: the length is guaranteed by the check above
        let count = u32::from_be_bytes(bytes[..COUNT_LENGTH].try_into().unwrap()) as usize;
        let expected = COUNT_LENGTH + count * BUNDLE_RECORD_LENGTH;
        if bytes.len() < expected {
            return Err(anyhow!(
                "share bundle too short: {} < {} for {} shares",
                bytes.len(),
                expected,
                count
            ));
        }

        let mut shares = Vec::with_capacity(count);
        for position in 0..count {
            let record = &bytes[COUNT_LENGTH + position * BUNDLE_RECORD_LENGTH..];
            // safe unwraps: record length is guaranteed by the check above
            let index = u32::from_be_bytes(record[..INDEX_LENGTH].try_into().unwrap());
            let value_length = u32::from_be_bytes(
                record[INDEX_LENGTH..INDEX_LENGTH + VALUE_LENGTH_FIELD]
                    .try_into()
                    .unwrap(),
            ) as usize;
            if value_length != VALUE_LENGTH {
                return Err(anyhow!(
                    "invalid share value length: {} != {}",
                    value_length,
                    VALUE_LENGTH
                ));
            }
            if index == 0 {
                return Err(anyhow!("invalid share index: zero"));
            }
            let value_start = INDEX_LENGTH + VALUE_LENGTH_FIELD;
            let value = field::element_from_bytes(
                record[value_start..value_start + VALUE_LENGTH]
                    .try_into()
                    .unwrap(),
            );
            shares.push(Share { index, value });
        }
        Ok(Self { shares })
    }
}

/// The low 8 big-endian bytes of the field modulus, as framed on the wire.
fn truncated_modulus() -> [u8; MODULUS_LENGTH] {
    let bytes = field::element_to_bytes(&field::modulus());
    // safe unwrap: the slice is exactly MODULUS_LENGTH bytes
    bytes[field::ELEMENT_LENGTH - MODULUS_LENGTH..].try_into().unwrap()
}

#[cfg(test)]
mod tests {
    use num::bigint::BigUint;

    use super::*;

    fn bundle() -> ShareBundle {
        ShareBundle {
            shares: vec![
                Share { index: 1, value: BigUint::from(0x0102_0304_u32) },
                Share { index: 7, value: field::modulus() - BigUint::from(1_u8) },
            ],
        }
    }

    #[test]
    fn test_share_record_roundtrip() {
        for share in bundle().shares {
            let record = encode_share(&share);
            assert_eq!(record.len(), SHARE_RECORD_LENGTH);
            assert_eq!(decode_share(&record).unwrap(), share);
        }
    }

    #[test]
    fn test_share_record_invalid() {
        assert!(decode_share(&[0_u8; SHARE_RECORD_LENGTH - 1]).is_err());
        // zero index
        assert!(decode_share(&[0_u8; SHARE_RECORD_LENGTH]).is_err());
    }

    #[test]
    fn test_bundle_layout() {
        let bytes = bundle().to_bytes();
        assert_eq!(bytes.len(), 4 + 2 * 32);
        // count
        assert_eq!(&bytes[..4], &[0, 0, 0, 2]);
        // first record: index 1, value length 16, left-padded value
        assert_eq!(&bytes[4..8], &[0, 0, 0, 1]);
        assert_eq!(&bytes[8..12], &[0, 0, 0, 16]);
        assert_eq!(&bytes[12..28], &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4]);
        // truncated modulus: the low 8 bytes of 2^127 - 1
        assert_eq!(&bytes[28..36], &[0xFF; 8]);
    }

    #[test]
    fn test_bundle_roundtrip() {
        let bundle = bundle();
        assert_eq!(ShareBundle::from_bytes(&bundle.to_bytes()).unwrap(), bundle);
    }

    #[test]
    fn test_bundle_decode_invalid() {
        assert!(ShareBundle::from_bytes(&[]).is_err());

        let mut bytes = bundle().to_bytes();
        bytes.truncate(bytes.len() - 1);
        assert!(ShareBundle::from_bytes(&bytes).is_err());

        // corrupt the value length field of the first record
        let mut bytes = bundle().to_bytes();
        bytes[11] = 17;
        assert!(ShareBundle::from_bytes(&bytes).is_err());
    }
}
