//! Fixed-point quantization of bounded model weights.
//!
//! Weights are clipped to `[-clipping_range, clipping_range]`, mapped
//! affinely onto `[0, target_range]` and rounded stochastically between the
//! two neighbouring integers, so the expectation of a quantized weight
//! equals its exact affine image. [`dequantize`] is the deterministic
//! inverse of that affine map.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;

#[derive(Debug, Error, Eq, PartialEq)]
/// Errors related to quantizing model weights.
pub enum QuantizeError {
    #[error("the clipping range must not be negative")]
    NegativeClippingRange,

    #[error("the target range must be positive")]
    ZeroTargetRange,

    #[error("model weights must be finite")]
    NonFiniteWeight,
}

/// Quantizes `weights` into integers in `[0, target_range]`.
///
/// The rounding draws come from a fresh entropy-seeded PRNG; use
/// [`quantize_with`] to control them.
///
/// A zero clipping range collapses every weight to `0`.
pub fn quantize(
    weights: &[f64],
    clipping_range: f64,
    target_range: u32,
) -> Result<Vec<u32>, QuantizeError> {
    quantize_with(&mut ChaCha20Rng::from_entropy(), weights, clipping_range, target_range)
}

/// Quantizes `weights` with rounding draws taken from `rng`.
pub fn quantize_with<R: Rng>(
    rng: &mut R,
    weights: &[f64],
    clipping_range: f64,
    target_range: u32,
) -> Result<Vec<u32>, QuantizeError> {
    if clipping_range < 0.0 || !clipping_range.is_finite() {
        return Err(QuantizeError::NegativeClippingRange);
    }
    if target_range == 0 {
        return Err(QuantizeError::ZeroTargetRange);
    }
    if weights.iter().any(|weight| !weight.is_finite()) {
        return Err(QuantizeError::NonFiniteWeight);
    }
    if clipping_range == 0.0 {
        return Ok(vec![0; weights.len()]);
    }

    let range = f64::from(target_range);
    Ok(weights
        .iter()
        .map(|&weight| {
            let clipped = weight.max(-clipping_range).min(clipping_range);
            // -c -> 0, 0 -> R/2, c -> R
            let exact = (clipped + clipping_range) / (2.0 * clipping_range) * range;
            let floor = exact.floor();
            let fraction = exact - floor;
            let quantized = if rng.gen::<f64>() < fraction {
                floor + 1.0
            } else {
                floor
            };
            quantized as u32
        })
        .collect())
}

/// Maps quantized integers back onto `[-clipping_range, clipping_range]`.
///
/// Boundary weights (`±clipping_range`, and `0` for an even target range)
/// round-trip exactly; interior weights carry an error bounded by one
/// quantization step.
pub fn dequantize(quantized: &[u32], clipping_range: f64, target_range: u32) -> Vec<f64> {
    if target_range == 0 || clipping_range == 0.0 {
        return vec![0.0; quantized.len()];
    }
    let range = f64::from(target_range);
    quantized
        .iter()
        .map(|&value| f64::from(value) / range * 2.0 * clipping_range - clipping_range)
        .collect()
}
