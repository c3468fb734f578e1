//! Deterministic mask generation by hashing in counter mode.
//!
//! See the [crypto module] documentation since this is a private module
//! anyways.
//!
//! [crypto module]: crate::crypto

use num::{bigint::BigUint, traits::identities::Zero};
use sha2::{Digest, Sha256};

/// Domain separation bytes mixed into every hash invocation.
const PRG_DOMAIN: &[u8] = b"secagg prg v1";

/// Expands `seed` into `count` integers in `[0, mod_range)`.
///
/// Output element `i` is `SHA256(seed ‖ domain ‖ i)` with a 4-byte
/// big-endian counter, reduced mod `mod_range`. The expansion is
/// deterministic for fixed inputs and distinct seeds yield distinct
/// sequences with overwhelming probability. Self-masks are generated from
/// this directly; pairwise masks go through HKDF instead.
///
/// A zero `mod_range` yields all-zero output.
pub fn pseudo_rand_gen(seed: &[u8], mod_range: &BigUint, count: usize) -> Vec<BigUint> {
    if mod_range.is_zero() {
        return vec![BigUint::zero(); count];
    }
    (0..count as u32)
        .map(|counter| {
            let mut hasher = Sha256::new();
            hasher.update(seed);
            hasher.update(PRG_DOMAIN);
            hasher.update(counter.to_be_bytes());
            BigUint::from_bytes_be(&hasher.finalize()) % mod_range
        })
        .collect()
}

/// [`pseudo_rand_gen`] for moduli that fit the 4-byte wire lanes.
///
/// `mod_range` must be at most `2^32` so each element fits one lane.
pub fn pseudo_rand_lanes(seed: &[u8], mod_range: u64, count: usize) -> Vec<u64> {
    debug_assert!(mod_range <= 1 << 32);
    pseudo_rand_gen(seed, &BigUint::from(mod_range), count)
        .into_iter()
        .map(|element| element.iter_u64_digits().next().unwrap_or(0))
        .collect()
}
