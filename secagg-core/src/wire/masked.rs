//! Masked-vector serialization.
//!
//! A masked vector is a sequence of 4-byte big-endian field-element lanes.
//! A plaintext whose length is not a multiple of 4 gets a final partial
//! lane: its bytes are read as if the lane were zero-padded on the left, so
//! the lane value stays below `2^(8 * tail_bytes)` and re-serializes into
//! exactly the original number of bytes. Masking arithmetic on the tail
//! lane reduces mod that smaller range, which is compatible with the full
//! lanes since it divides [`LANE_MODULUS`].
//!
//! See the [wire module] documentation since this is a private module
//! anyways.
//!
//! [wire module]: crate::wire

/// Length in bytes of one full serialized lane.
pub const LANE_LENGTH: usize = 4;

/// The modulus of masking arithmetic on full lanes.
pub const LANE_MODULUS: u64 = 1 << (8 * LANE_LENGTH as u32);

/// Splits bytes into big-endian lane values.
///
/// The final lane may be partial; its value is below `2^(8 * tail)` where
/// `tail` is the number of leftover bytes.
pub fn bytes_to_lanes(bytes: &[u8]) -> Vec<u64> {
    bytes
        .chunks(LANE_LENGTH)
        .map(|chunk| {
            let mut lane = [0_u8; LANE_LENGTH];
            lane[LANE_LENGTH - chunk.len()..].copy_from_slice(chunk);
            u64::from(u32::from_be_bytes(lane))
        })
        .collect()
}

/// Serializes lane values back into exactly `byte_length` bytes.
///
/// The final lane is reduced to the range of its byte width before
/// encoding, so the output length always equals the length of the plaintext
/// the lanes were read from.
///
/// # Panics
/// Panics if `byte_length` does not correspond to `lanes.len()` lanes.
pub fn lanes_to_bytes(lanes: &[u64], byte_length: usize) -> Vec<u8> {
    assert_eq!((byte_length + LANE_LENGTH - 1) / LANE_LENGTH, lanes.len());
    let mut bytes = Vec::with_capacity(byte_length);
    for (position, &lane) in lanes.iter().enumerate() {
        let width = (byte_length - position * LANE_LENGTH).min(LANE_LENGTH);
        let reduced = lane % lane_modulus(position, byte_length);
        bytes.extend_from_slice(&(reduced as u32).to_be_bytes()[LANE_LENGTH - width..]);
    }
    bytes
}

/// The modulus of masking arithmetic on the lane at `position` for a vector
/// of `byte_length` bytes.
pub(crate) fn lane_modulus(position: usize, byte_length: usize) -> u64 {
    let remaining = byte_length - position * LANE_LENGTH;
    if remaining >= LANE_LENGTH {
        LANE_MODULUS
    } else {
        1 << (8 * remaining as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_roundtrip() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB, 0xCC, 0xDD];
        let lanes = bytes_to_lanes(&bytes);
        assert_eq!(lanes, vec![0x0102_0304, 0xAABB_CCDD]);
        assert_eq!(lanes_to_bytes(&lanes, bytes.len()), bytes.to_vec());
    }

    #[test]
    fn test_partial_tail_lane() {
        let bytes = [0x01, 0x02, 0x03, 0x04, 0xAA, 0xBB];
        let lanes = bytes_to_lanes(&bytes);
        assert_eq!(lanes, vec![0x0102_0304, 0xAABB]);
        assert_eq!(lanes_to_bytes(&lanes, bytes.len()), bytes.to_vec());
    }

    #[test]
    fn test_output_length_equals_input_length() {
        for length in 0..=9 {
            let bytes = vec![0xFF; length];
            let lanes = bytes_to_lanes(&bytes);
            assert_eq!(lanes_to_bytes(&lanes, length).len(), length);
        }
    }

    #[test]
    fn test_tail_lane_reduction() {
        // a masked tail lane may exceed its byte width before serialization
        let masked = vec![0x1_2345_6789, 0x1AB];
        assert_eq!(lanes_to_bytes(&masked, 5), vec![0x23, 0x45, 0x67, 0x89, 0xAB]);
    }

    #[test]
    fn test_lane_modulus() {
        assert_eq!(lane_modulus(0, 8), LANE_MODULUS);
        assert_eq!(lane_modulus(1, 8), LANE_MODULUS);
        assert_eq!(lane_modulus(1, 6), 1 << 16);
        assert_eq!(lane_modulus(1, 5), 1 << 8);
    }
}
