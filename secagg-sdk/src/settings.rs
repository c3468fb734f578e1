use serde::{Deserialize, Serialize};
use thiserror::Error;

use secagg_core::ParticipantIndex;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
/// The immutable parameters of one protocol round.
///
/// Supplied by the session layer when a device is selected for a round and
/// never retained across rounds.
pub struct RoundContext {
    /// Identifier of the training session this round belongs to.
    pub session_id: String,
    /// Monotonic round number within the session.
    pub round_id: u64,
    /// Number of shares required to reconstruct a self-mask seed.
    pub threshold: u32,
    /// Number of participants selected for the round.
    pub total_clients: u32,
    /// This device's index, `1..=total_clients`.
    pub my_index: ParticipantIndex,
}

#[derive(Debug, Error, Eq, PartialEq)]
/// Errors related to malformed round parameters.
pub enum InvalidRoundContext {
    #[error("the threshold must be between 1 and {total_clients}, got {threshold}")]
    Threshold { threshold: u32, total_clients: u32 },

    #[error("the participant index must be between 1 and {total_clients}, got {my_index}")]
    Index {
        my_index: ParticipantIndex,
        total_clients: u32,
    },
}

impl RoundContext {
    /// Checks the round parameters, before any cryptographic work happens.
    pub fn validate(&self) -> Result<(), InvalidRoundContext> {
        if self.threshold < 1 || self.threshold > self.total_clients {
            return Err(InvalidRoundContext::Threshold {
                threshold: self.threshold,
                total_clients: self.total_clients,
            });
        }
        if self.my_index < 1 || self.my_index > self.total_clients {
            return Err(InvalidRoundContext::Index {
                my_index: self.my_index,
                total_clients: self.total_clients,
            });
        }
        Ok(())
    }

    /// The derivation context bound into every pairwise key and mask.
    ///
    /// Contains the session, the round and the unordered pair, so both
    /// sides derive identical bytes and no derivation survives into another
    /// round.
    pub(crate) fn pair_context(
        &self,
        a: ParticipantIndex,
        b: ParticipantIndex,
    ) -> Vec<u8> {
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let mut context = self.session_id.as_bytes().to_vec();
        context.extend_from_slice(&self.round_id.to_be_bytes());
        context.extend_from_slice(&low.to_be_bytes());
        context.extend_from_slice(&high.to_be_bytes());
        context
    }
}
