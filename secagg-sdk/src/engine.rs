//! The 4-stage SecAgg+ client state machine.

use std::collections::BTreeMap;

use derive_more::Display;
use num::bigint::BigUint;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use thiserror::Error;
use tracing::{debug, warn};

use secagg_core::{
    crypto::{
        decrypt_share,
        derive_pairwise_mask,
        derive_share_key,
        encrypt_share,
        pseudo_rand_lanes,
        CryptoError,
        KeyPair,
        PublicKey,
    },
    field,
    shamir::{self, Share, ShamirError},
    wire::{self, LANE_MODULUS},
    ParticipantIndex,
};

use crate::settings::{InvalidRoundContext, RoundContext};

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Ord, PartialOrd)]
/// The protocol stage of a client engine.
///
/// Stages are strictly sequential and never revisited.
pub enum Stage {
    #[display(fmt = "SETUP")]
    Setup,
    #[display(fmt = "SHARE_KEYS")]
    ShareKeys,
    #[display(fmt = "COLLECT_MASKED_VECTORS")]
    CollectMaskedVectors,
    #[display(fmt = "UNMASK")]
    Unmask,
    #[display(fmt = "COMPLETED")]
    Completed,
}

#[derive(Debug, Error)]
/// Errors related to driving a client through a round.
pub enum EngineError {
    #[error("invalid round context: {0}")]
    InvalidRound(#[from] InvalidRoundContext),

    /// A method was called out of stage order. This fails loud and leaves
    /// the stage untouched, since acting on it could corrupt masking state.
    #[error("operation requires stage {expected}, but the engine is in stage {actual}")]
    StateViolation { expected: Stage, actual: Stage },

    /// A second split would desynchronize from the shares already sent.
    #[error("encrypted shares were already generated for this round")]
    SharesAlreadyGenerated,

    #[error("encrypted shares must be generated before peer shares are received")]
    SharesNotGenerated,

    #[error("peer index {0} is outside this round's participant range")]
    InvalidPeerIndex(ParticipantIndex),

    #[error("peer {0} sent a malformed share")]
    MalformedShare(ParticipantIndex),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Sharing(#[from] ShamirError),
}

/// One device's participation in one secure-aggregation round.
///
/// The engine is single-round and single-owner: callers must serialize
/// calls to the stage-transition methods. Every public operation either
/// fully succeeds (and possibly advances the stage) or fails leaving the
/// stage unchanged.
#[derive(Debug)]
pub struct SecAggClient {
    round: RoundContext,
    stage: Stage,
    keys: KeyPair,
    /// Self-mask seed; a field element so it can be Shamir-shared over p.
    seed: BigUint,
    /// Peer public keys, recorded once during SETUP. Never contains
    /// `my_index`.
    peers: BTreeMap<ParticipantIndex, PublicKey>,
    /// Shares of our own seed, one per participant index, kept for the
    /// [`own_share`] accessor after [`generate_encrypted_shares`].
    ///
    /// [`own_share`]: SecAggClient::own_share
    /// [`generate_encrypted_shares`]: SecAggClient::generate_encrypted_shares
    own_shares: Option<BTreeMap<ParticipantIndex, Share>>,
    /// Sealed shares received from peers, decrypted lazily at reveal time.
    received: BTreeMap<ParticipantIndex, Vec<u8>>,
}

impl SecAggClient {
    /// Creates an engine for one round, with a fresh key pair and a fresh
    /// self-mask seed.
    ///
    /// # Errors
    /// Fails with an invalid-argument error if the round parameters are
    /// malformed; nothing is generated in that case.
    pub fn new(round: RoundContext) -> Result<Self, EngineError> {
        round.validate()?;
        let keys = KeyPair::generate();
        let seed = field::generate_element(&mut ChaCha20Rng::from_entropy(), &field::modulus());
        debug!(
            session = %round.session_id,
            round = round.round_id,
            index = round.my_index,
            "engine created"
        );
        Ok(Self {
            round,
            stage: Stage::Setup,
            keys,
            seed,
            peers: BTreeMap::new(),
            own_shares: None,
            received: BTreeMap::new(),
        })
    }

    /// The current protocol stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// This round's ephemeral public key, available from SETUP on.
    pub fn public_key(&self) -> PublicKey {
        self.keys.public
    }

    /// Records the peer public keys and advances SETUP → SHARE_KEYS.
    ///
    /// An entry for this device's own index is ignored. A second call is a
    /// state violation: peer keys are recorded exactly once per round.
    pub fn receive_peer_public_keys(
        &mut self,
        keys: BTreeMap<ParticipantIndex, PublicKey>,
    ) -> Result<(), EngineError> {
        self.expect_stage(Stage::Setup)?;
        for &index in keys.keys() {
            if index < 1 || index > self.round.total_clients {
                return Err(EngineError::InvalidPeerIndex(index));
            }
        }
        self.peers = keys;
        self.peers.remove(&self.round.my_index);
        self.advance(Stage::ShareKeys);
        Ok(())
    }

    /// Splits this device's self-mask seed and seals one share per peer.
    ///
    /// The share destined for peer `p` is the seed polynomial evaluated at
    /// `p`, sealed under the key derived from the ECDH secret with `p`. The
    /// returned blobs are safe to resend; re-invoking this method is a
    /// state violation because it would split a different polynomial.
    pub fn generate_encrypted_shares(
        &mut self,
    ) -> Result<BTreeMap<ParticipantIndex, Vec<u8>>, EngineError> {
        self.expect_stage(Stage::ShareKeys)?;
        if self.own_shares.is_some() {
            return Err(EngineError::SharesAlreadyGenerated);
        }

        let shares = shamir::split(
            &self.seed,
            self.round.threshold,
            self.round.total_clients,
        )?;
        let own_shares = shares
            .into_iter()
            .map(|share| (share.index, share))
            .collect::<BTreeMap<_, _>>();

        let mut sealed = BTreeMap::new();
        for (&peer, public) in &self.peers {
            // safe index: split covers every participant index
            let share = &own_shares[&peer];
            let secret = self.keys.secret.shared_secret(public);
            let key = derive_share_key(
                &secret,
                &self.round.pair_context(self.round.my_index, peer),
            )?;
            sealed.insert(peer, encrypt_share(&key, &wire::encode_share(share))?);
        }

        self.own_shares = Some(own_shares);
        debug!(count = sealed.len(), "encrypted shares generated");
        Ok(sealed)
    }

    /// Stores the sealed shares received from peers and advances
    /// SHARE_KEYS → COLLECT_MASKED_VECTORS.
    ///
    /// Blobs are kept opaque here; decryption is deferred to
    /// [`reveal_shares_for_dropped`], so a tampered blob only surfaces when
    /// its sender is revealed. Blobs from unknown senders are dropped.
    ///
    /// [`reveal_shares_for_dropped`]: SecAggClient::reveal_shares_for_dropped
    pub fn receive_encrypted_shares(
        &mut self,
        blobs: BTreeMap<ParticipantIndex, Vec<u8>>,
    ) -> Result<(), EngineError> {
        self.expect_stage(Stage::ShareKeys)?;
        if self.own_shares.is_none() {
            return Err(EngineError::SharesNotGenerated);
        }
        self.received = blobs
            .into_iter()
            .filter(|(sender, _)| {
                let known = self.peers.contains_key(sender);
                if !known {
                    warn!(sender, "dropping sealed share from unknown sender");
                }
                known
            })
            .collect();
        self.advance(Stage::CollectMaskedVectors);
        Ok(())
    }

    /// Masks the plaintext update and advances
    /// COLLECT_MASKED_VECTORS → UNMASK.
    ///
    /// The plaintext is read as 4-byte big-endian lanes. The self-mask
    /// expanded from this device's private seed is added to every lane;
    /// then, for every known peer `p`, the pairwise mask shared with `p` is
    /// added if `my_index > p` and subtracted if `my_index < p`. Summing
    /// any set of participants' masked vectors therefore cancels every
    /// pairwise term, leaving the plaintext sum plus the self-masks.
    ///
    /// The output has exactly the length of `plaintext`.
    pub fn mask_model_update(&mut self, plaintext: &[u8]) -> Result<Vec<u8>, EngineError> {
        self.expect_stage(Stage::CollectMaskedVectors)?;

        let lanes = wire::bytes_to_lanes(plaintext);
        let seed_bytes = field::element_to_bytes(&self.seed);
        let self_mask = pseudo_rand_lanes(&seed_bytes, LANE_MODULUS, lanes.len());
        let mut masked = lanes
            .iter()
            .zip(&self_mask)
            .map(|(&lane, &mask)| (lane + mask) % LANE_MODULUS)
            .collect::<Vec<_>>();

        for (&peer, public) in &self.peers {
            let secret = self.keys.secret.shared_secret(public);
            let pair_mask = derive_pairwise_mask(
                &secret,
                masked.len(),
                LANE_MODULUS,
                &self.round.pair_context(self.round.my_index, peer),
            )?;
            // the index comparison lets both sides agree on opposite signs
            // without negotiation
            let add = self.round.my_index > peer;
            for (lane, mask) in masked.iter_mut().zip(pair_mask) {
                *lane = if add {
                    (*lane + mask) % LANE_MODULUS
                } else {
                    (*lane + LANE_MODULUS - mask) % LANE_MODULUS
                };
            }
        }

        let output = wire::lanes_to_bytes(&masked, plaintext.len());
        self.advance(Stage::Unmask);
        Ok(output)
    }

    /// Reveals the shares this device holds for the given dropped peers.
    ///
    /// Decrypts the sealed shares received from those peers, so the server
    /// can reconstruct and remove their self-masks once at least
    /// `threshold` devices reveal. Dropped indices this device never
    /// received a share from are omitted, never fabricated.
    ///
    /// # Errors
    /// Fails with an authentication error if a stored blob does not
    /// decrypt; the caller should then treat that peer as dropped for good.
    pub fn reveal_shares_for_dropped(
        &self,
        dropped: &[ParticipantIndex],
    ) -> Result<BTreeMap<ParticipantIndex, Share>, EngineError> {
        self.expect_stage(Stage::Unmask)?;
        let mut revealed = BTreeMap::new();
        for &peer in dropped {
            let blob = match self.received.get(&peer) {
                Some(blob) => blob,
                None => {
                    warn!(peer, "no share held for dropped peer, omitting");
                    continue;
                }
            };
            // safe index: received only holds entries for known peers
            let public = &self.peers[&peer];
            let secret = self.keys.secret.shared_secret(public);
            let key = derive_share_key(
                &secret,
                &self.round.pair_context(self.round.my_index, peer),
            )?;
            let record = decrypt_share(&key, blob)?;
            let share =
                wire::decode_share(&record).map_err(|_| EngineError::MalformedShare(peer))?;
            revealed.insert(peer, share);
        }
        Ok(revealed)
    }

    /// Finalizes the round, advancing UNMASK → COMPLETED.
    ///
    /// COMPLETED is terminal; only accessors remain usable afterwards.
    pub fn complete(&mut self) -> Result<(), EngineError> {
        self.expect_stage(Stage::Unmask)?;
        self.advance(Stage::Completed);
        Ok(())
    }

    /// The share of this device's own seed destined for `peer`.
    ///
    /// Available from the moment shares have been generated, in any stage.
    pub fn own_share(&self, peer: ParticipantIndex) -> Option<&Share> {
        self.own_shares.as_ref()?.get(&peer)
    }

    fn expect_stage(&self, expected: Stage) -> Result<(), EngineError> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(EngineError::StateViolation {
                expected,
                actual: self.stage,
            })
        }
    }

    fn advance(&mut self, stage: Stage) {
        debug!(from = %self.stage, to = %stage, "stage transition");
        self.stage = stage;
    }
}
