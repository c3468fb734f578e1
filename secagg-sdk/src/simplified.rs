//! Server-coordinated orchestration without pairwise exchange.
//!
//! A device masks its update against a vector expanded from one random
//! seed, splits the seed among the server-supplied participant set and
//! submits everything in a single shot. The server alone collects at least
//! `threshold` shares per dropped device, reconstructs the seeds and
//! removes the masks; no peer ever sees another peer's artifacts, so the
//! shares travel serialized but not sealed.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

use secagg_core::{
    crypto::pseudo_rand_lanes,
    field,
    shamir::{self, ShamirError},
    wire::{bytes_to_lanes, lanes_to_bytes, ShareBundle, LANE_MODULUS},
    ParticipantIndex,
};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
/// The server-supplied parameters of one simplified aggregation round.
pub struct SimpleAggregationParams {
    pub session_id: String,
    /// Number of shares the server needs to reconstruct a seed.
    pub threshold: u32,
    /// Number of participants selected for the round.
    pub total_clients: u32,
    /// The participant indices the seed is split among, one per client.
    pub participant_ids: Vec<ParticipantIndex>,
}

#[derive(Debug, Error)]
/// Errors related to the simplified submission path.
pub enum SimplifiedError {
    #[error("expected {total_clients} participant ids, got {actual}")]
    ParticipantCount { total_clients: u32, actual: usize },

    #[error(transparent)]
    Sharing(#[from] ShamirError),
}

/// Everything the device submits for one simplified round.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SimpleSubmission {
    /// The masked update, same length as the plaintext.
    pub masked_update: Vec<u8>,
    /// The serialized bundle of seed shares, one per participant.
    pub share_bundle: Vec<u8>,
    /// SHA-256 over `session_id || masked_update`.
    pub integrity_tag: [u8; 32],
}

impl SimpleAggregationParams {
    fn validate(&self) -> Result<(), SimplifiedError> {
        if self.participant_ids.len() != self.total_clients as usize {
            return Err(SimplifiedError::ParticipantCount {
                total_clients: self.total_clients,
                actual: self.participant_ids.len(),
            });
        }
        // index and threshold constraints are enforced by the split itself
        Ok(())
    }
}

/// Masks `plaintext` under a fresh seed and packages the full submission.
///
/// The plaintext is read as 4-byte big-endian lanes and the mask expanded
/// from the seed is added lane-wise, so the masked update serializes to
/// exactly the plaintext length. The seed itself is a field element split
/// with the server-supplied layout; the server removes the mask after
/// reconstructing the seed from at least `threshold` shares.
///
/// # Errors
/// Fails before any masking work if the round parameters are malformed, so
/// nothing derived from the seed ever leaves the device in that case.
pub fn submit_masked_update(
    params: &SimpleAggregationParams,
    plaintext: &[u8],
) -> Result<SimpleSubmission, SimplifiedError> {
    params.validate()?;

    let seed = field::generate_element(&mut ChaCha20Rng::from_entropy(), &field::modulus());
    let shares = shamir::split_among(&seed, params.threshold, &params.participant_ids)?;
    let share_bundle = ShareBundle { shares }.to_bytes();

    let lanes = bytes_to_lanes(plaintext);
    let mask = pseudo_rand_lanes(&field::element_to_bytes(&seed), LANE_MODULUS, lanes.len());
    let masked = lanes
        .iter()
        .zip(mask)
        .map(|(&lane, mask)| (lane + mask) % LANE_MODULUS)
        .collect::<Vec<_>>();
    let masked_update = lanes_to_bytes(&masked, plaintext.len());

    let mut hasher = Sha256::new();
    hasher.update(params.session_id.as_bytes());
    hasher.update(&masked_update);
    let integrity_tag = hasher.finalize().into();

    debug!(
        session = %params.session_id,
        shares = params.total_clients,
        bytes = masked_update.len(),
        "simplified submission assembled"
    );
    Ok(SimpleSubmission {
        masked_update,
        share_bundle,
        integrity_tag,
    })
}
