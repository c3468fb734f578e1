//! Shamir threshold secret sharing over the 127-bit prime field.
//!
//! A secret is the constant term of a random polynomial of degree
//! `threshold - 1`; a participant's share is the polynomial evaluated at
//! that participant's index. Any `threshold` shares with distinct indices
//! reconstruct the secret by Lagrange interpolation at zero, fewer reveal
//! nothing.

use std::{collections::HashSet, iter};

use num::{
    bigint::BigUint,
    traits::identities::{One, Zero},
};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{field, ParticipantIndex};

#[derive(Debug, Error, Eq, PartialEq)]
/// Errors related to splitting and reconstructing secrets.
pub enum ShamirError {
    #[error("the secret must be below the field modulus")]
    SecretOutOfRange,

    #[error("the threshold must be between 1 and {total}, got {threshold}")]
    InvalidThreshold { threshold: u32, total: u32 },

    #[error("share indices must be positive")]
    ZeroIndex,

    #[error("share index {0} occurs more than once")]
    DuplicateIndex(ParticipantIndex),

    #[error("the value of share {0} is not a field element")]
    ValueOutOfRange(ParticipantIndex),

    #[error("no shares were provided")]
    NoShares,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
/// One participant's share of a secret.
///
/// A share is meaningless on its own: it is one point of the sharing
/// polynomial, with the participant index as its public x-coordinate.
pub struct Share {
    pub index: ParticipantIndex,
    pub value: BigUint,
}

/// Splits `secret` into `total` shares, any `threshold` of which reconstruct it.
///
/// Shares are evaluated at the indices `1..=total`.
///
/// # Errors
/// Fails if the secret is not a field element or the threshold does not
/// satisfy `1 <= threshold <= total`.
pub fn split(
    secret: &BigUint,
    threshold: u32,
    total: u32,
) -> Result<Vec<Share>, ShamirError> {
    let indices = (1..=total).collect::<Vec<_>>();
    split_among(secret, threshold, &indices)
}

/// Splits `secret` into one share per entry of `indices`.
///
/// This is the layout-controlled variant used when the server supplies the
/// participant indices instead of the dense `1..=total` range.
pub fn split_among(
    secret: &BigUint,
    threshold: u32,
    indices: &[ParticipantIndex],
) -> Result<Vec<Share>, ShamirError> {
    validate_layout(secret, threshold, indices)?;
    let mut prng = ChaCha20Rng::from_entropy();
    Ok(split_with(secret, threshold, indices, &mut prng))
}

/// Splits many secrets under one participant layout.
///
/// Amortizes parameter validation and PRNG setup across a whole vector of
/// secrets. The outer result vector is indexed like `secrets`.
pub fn split_multiple(
    secrets: &[BigUint],
    threshold: u32,
    total: u32,
) -> Result<Vec<Vec<Share>>, ShamirError> {
    let indices = (1..=total).collect::<Vec<_>>();
    for secret in secrets {
        validate_layout(secret, threshold, &indices)?;
    }
    let mut prng = ChaCha20Rng::from_entropy();
    Ok(secrets
        .iter()
        .map(|secret| split_with(secret, threshold, &indices, &mut prng))
        .collect())
}

/// Reconstructs the secret from any qualifying set of shares.
///
/// Every subset of at least `threshold` shares with distinct indices yields
/// the identical secret, independent of ordering and of extra shares.
///
/// # Errors
/// Fails if no shares are given, an index is zero or duplicated, or a value
/// is not a field element. Reconstruction from fewer shares than the
/// original threshold succeeds but yields an unrelated field element; the
/// threshold is not encoded in the shares.
pub fn reconstruct(shares: &[Share]) -> Result<BigUint, ShamirError> {
    if shares.is_empty() {
        return Err(ShamirError::NoShares);
    }
    let p = field::modulus();
    let mut seen = HashSet::new();
    for share in shares {
        if share.index == 0 {
            return Err(ShamirError::ZeroIndex);
        }
        if !seen.insert(share.index) {
            return Err(ShamirError::DuplicateIndex(share.index));
        }
        if share.value >= p {
            return Err(ShamirError::ValueOutOfRange(share.index));
        }
    }

    let mut secret = BigUint::zero();
    for share in shares {
        let mut numerator = BigUint::one();
        let mut denominator = BigUint::one();
        for other in shares {
            if other.index == share.index {
                continue;
            }
            numerator = numerator * BigUint::from(other.index) % &p;
            // x_j - x_i, lifted into the field to stay non-negative
            let difference = if other.index > share.index {
                BigUint::from(other.index - share.index)
            } else {
                &p - BigUint::from(share.index - other.index)
            };
            denominator = denominator * difference % &p;
        }
        let lagrange = numerator * field::inverse(&denominator, &p) % &p;
        secret = (secret + &share.value * lagrange) % &p;
    }
    Ok(secret)
}

/// Reconstructs many secrets, one per inner share set.
pub fn reconstruct_multiple(batches: &[Vec<Share>]) -> Result<Vec<BigUint>, ShamirError> {
    batches.iter().map(|shares| reconstruct(shares)).collect()
}

fn validate_layout(
    secret: &BigUint,
    threshold: u32,
    indices: &[ParticipantIndex],
) -> Result<(), ShamirError> {
    if *secret >= field::modulus() {
        return Err(ShamirError::SecretOutOfRange);
    }
    let total = indices.len() as u32;
    if threshold < 1 || threshold > total {
        return Err(ShamirError::InvalidThreshold { threshold, total });
    }
    let mut seen = HashSet::new();
    for &index in indices {
        if index == 0 {
            return Err(ShamirError::ZeroIndex);
        }
        if !seen.insert(index) {
            return Err(ShamirError::DuplicateIndex(index));
        }
    }
    Ok(())
}

fn split_with<R: RngCore>(
    secret: &BigUint,
    threshold: u32,
    indices: &[ParticipantIndex],
    prng: &mut R,
) -> Vec<Share> {
    let p = field::modulus();
    let coefficients = iter::once(secret.clone())
        .chain((1..threshold).map(|_| field::generate_element(prng, &p)))
        .collect::<Vec<_>>();
    indices
        .iter()
        .map(|&index| Share {
            index,
            value: evaluate(&coefficients, index, &p),
        })
        .collect()
}

// Horner evaluation of the sharing polynomial at x, mod p.
fn evaluate(coefficients: &[BigUint], x: ParticipantIndex, p: &BigUint) -> BigUint {
    let x = BigUint::from(x);
    coefficients
        .iter()
        .rev()
        .fold(BigUint::zero(), |acc, coefficient| (acc * &x + coefficient) % p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> BigUint {
        BigUint::parse_bytes(b"123456789123456789123456789", 10).unwrap()
    }

    #[test]
    fn test_split_reconstruct() {
        let shares = split(&secret(), 3, 5).unwrap();
        assert_eq!(shares.len(), 5);
        assert_eq!(
            shares.iter().map(|share| share.index).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5],
        );
        assert_eq!(reconstruct(&shares).unwrap(), secret());
    }

    #[test]
    fn test_every_qualifying_subset_agrees() {
        let shares = split(&secret(), 2, 3).unwrap();
        // all 2-subsets, in both orders, and the full set
        for i in 0..3 {
            for j in 0..3 {
                if i == j {
                    continue;
                }
                let subset = vec![shares[i].clone(), shares[j].clone()];
                assert_eq!(reconstruct(&subset).unwrap(), secret());
            }
        }
        assert_eq!(reconstruct(&shares).unwrap(), secret());
    }

    #[test]
    fn test_threshold_one_degenerates() {
        let shares = split(&secret(), 1, 4).unwrap();
        for share in &shares {
            assert_eq!(share.value, secret());
            assert_eq!(reconstruct(&[share.clone()]).unwrap(), secret());
        }
    }

    #[test]
    fn test_split_among_custom_indices() {
        let indices = [7, 42, 1000];
        let shares = split_among(&secret(), 2, &indices).unwrap();
        assert_eq!(
            shares.iter().map(|share| share.index).collect::<Vec<_>>(),
            indices.to_vec(),
        );
        assert_eq!(reconstruct(&shares[1..]).unwrap(), secret());
    }

    #[test]
    fn test_invalid_arguments() {
        assert_eq!(
            split(&secret(), 0, 3).unwrap_err(),
            ShamirError::InvalidThreshold { threshold: 0, total: 3 },
        );
        assert_eq!(
            split(&secret(), 4, 3).unwrap_err(),
            ShamirError::InvalidThreshold { threshold: 4, total: 3 },
        );
        assert_eq!(
            split(&field::modulus(), 2, 3).unwrap_err(),
            ShamirError::SecretOutOfRange,
        );
        assert_eq!(
            split_among(&secret(), 1, &[0, 1]).unwrap_err(),
            ShamirError::ZeroIndex,
        );
        assert_eq!(
            split_among(&secret(), 1, &[1, 1]).unwrap_err(),
            ShamirError::DuplicateIndex(1),
        );
    }

    #[test]
    fn test_reconstruct_rejects_malformed_shares() {
        assert_eq!(reconstruct(&[]).unwrap_err(), ShamirError::NoShares);

        let mut shares = split(&secret(), 2, 3).unwrap();
        shares[1].index = shares[0].index;
        assert_eq!(
            reconstruct(&shares).unwrap_err(),
            ShamirError::DuplicateIndex(shares[0].index),
        );

        let mut shares = split(&secret(), 2, 3).unwrap();
        shares[2].value = field::modulus();
        assert_eq!(
            reconstruct(&shares).unwrap_err(),
            ShamirError::ValueOutOfRange(3),
        );
    }

    #[test]
    fn test_split_multiple() {
        let secrets = vec![
            BigUint::from(0_u8),
            secret(),
            field::modulus() - BigUint::from(1_u8),
        ];
        let batches = split_multiple(&secrets, 2, 4).unwrap();
        assert_eq!(batches.len(), 3);
        let reconstructed = reconstruct_multiple(&batches).unwrap();
        assert_eq!(reconstructed, secrets);
        // a threshold-sized subset of each batch suffices as well
        for (batch, expected) in batches.iter().zip(&secrets) {
            assert_eq!(&reconstruct(&batch[2..]).unwrap(), expected);
        }
    }
}
