//! Arithmetic over the 127-bit Mersenne-prime field.
//!
//! Secrets shared via [`shamir`] and the self-mask seeds of both protocol
//! variants are elements of this field.
//!
//! [`shamir`]: crate::shamir

use num::{
    bigint::BigUint,
    traits::identities::{One, Zero},
};
use rand::RngCore;

/// Length in bytes of the canonical big-endian encoding of a field element.
pub const ELEMENT_LENGTH: usize = 16;

/// Returns the field modulus `p = 2^127 - 1`.
pub fn modulus() -> BigUint {
    (BigUint::one() << 127) - BigUint::one()
}

/// Samples a uniform integer in `[0, max_int)` by rejection.
///
/// Returns zero if `max_int` is zero.
pub fn generate_element<R: RngCore>(prng: &mut R, max_int: &BigUint) -> BigUint {
    if max_int.is_zero() {
        return BigUint::zero();
    }
    let mut bytes = vec![0_u8; max_int.to_bytes_be().len()];
    let mut candidate = max_int.clone();
    while &candidate >= max_int {
        prng.fill_bytes(&mut bytes);
        candidate = BigUint::from_bytes_be(&bytes);
    }
    candidate
}

/// Computes the multiplicative inverse of `element` modulo the prime `p`.
///
/// Uses Fermat's little theorem, so `element` must be non-zero mod `p`.
pub fn inverse(element: &BigUint, p: &BigUint) -> BigUint {
    element.modpow(&(p - BigUint::from(2_u8)), p)
}

/// Encodes a field element as 16 big-endian bytes, zero-padded on the left.
///
/// # Panics
/// Panics if `element` does not fit into 16 bytes. Field elements are below
/// `2^127` and always fit.
pub fn element_to_bytes(element: &BigUint) -> [u8; ELEMENT_LENGTH] {
    let bytes = element.to_bytes_be();
    let mut out = [0_u8; ELEMENT_LENGTH];
    out[ELEMENT_LENGTH - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Decodes a field element from its canonical 16-byte big-endian encoding.
pub fn element_from_bytes(bytes: &[u8; ELEMENT_LENGTH]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}
