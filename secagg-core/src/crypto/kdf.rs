//! HKDF-SHA256 key and mask derivation.
//!
//! See the [crypto module] documentation since this is a private module
//! anyways.
//!
//! [crypto module]: crate::crypto

use std::convert::TryInto;

use hkdf::Hkdf;
use sha2::Sha256;

use super::{agreement::SharedSecret, ByteObject, CryptoError};

/// Domain label for pairwise mask derivation.
///
/// Distinct from [`SHARE_KEY_LABEL`] so a mask can never collide with an
/// encryption key derived from the same shared secret.
const PAIRWISE_MASK_LABEL: &[u8] = b"secagg pairwise mask v1";

/// Domain label for share-encryption key derivation.
const SHARE_KEY_LABEL: &[u8] = b"secagg share key v1";

/// Extract-then-expand HKDF-SHA256.
///
/// Varying either the keying material or the info bytes changes the output;
/// the output length is exactly `length` bytes.
///
/// # Errors
/// Fails with [`CryptoError::Unavailable`] if `length` exceeds what
/// HKDF-SHA256 can produce (255 blocks of 32 bytes).
pub fn hkdf_expand(
    ikm: &[u8],
    length: usize,
    info: &[u8],
    salt: Option<&[u8]>,
) -> Result<Vec<u8>, CryptoError> {
    let hkdf = Hkdf::<Sha256>::new(salt, ikm);
    let mut okm = vec![0_u8; length];
    hkdf.expand(info, &mut okm)
        .map_err(|_| CryptoError::Unavailable)?;
    Ok(okm)
}

/// Derives the `count` pairwise mask elements shared by one pair of
/// participants.
///
/// The shared secret is expanded under [`PAIRWISE_MASK_LABEL`] plus the
/// round `context`, sliced into 4-byte big-endian chunks and reduced mod
/// `modulus`. Both sides of a pair derive the identical mask from their
/// symmetric shared secret; a different round context yields a different
/// mask, which prevents cross-round reuse.
pub fn derive_pairwise_mask(
    secret: &SharedSecret,
    count: usize,
    modulus: u64,
    context: &[u8],
) -> Result<Vec<u64>, CryptoError> {
    if modulus == 0 {
        return Err(CryptoError::ZeroModulus);
    }
    let info = [PAIRWISE_MASK_LABEL, context].concat();
    let okm = hkdf_expand(secret.as_slice(), count * 4, &info, None)?;
    Ok(okm
        .chunks_exact(4)
        // safe unwrap: chunks_exact yields 4-byte slices
        .map(|chunk| u64::from(u32::from_be_bytes(chunk.try_into().unwrap())) % modulus)
        .collect())
}

/// Derives the AES-256 key under which one pair of participants encrypts
/// Shamir shares for each other.
pub fn derive_share_key(
    secret: &SharedSecret,
    context: &[u8],
) -> Result<[u8; 32], CryptoError> {
    let info = [SHARE_KEY_LABEL, context].concat();
    let okm = hkdf_expand(secret.as_slice(), 32, &info, None)?;
    // safe unwrap: the requested length is 32
    Ok(okm.as_slice().try_into().unwrap())
}
