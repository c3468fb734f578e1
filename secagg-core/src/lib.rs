//! # SecAgg+ protocol primitives
//!
//! This crate contains the building blocks of the on-device secure
//! aggregation protocol: a coordinating server learns the *sum* of many
//! devices' model updates, never an individual update. The pieces are
//! composed by the client engine in the `secagg-sdk` crate.
//!
//! - [`field`]: arithmetic over the 127-bit Mersenne-prime field.
//! - [`shamir`]: Shamir threshold secret sharing over that field.
//! - [`quantize`]: fixed-point quantization with stochastic rounding.
//! - [`crypto`]: X25519 key agreement, HKDF-SHA256 derivation, AES-GCM
//!   share transport and the deterministic mask generator.
//! - [`wire`]: the byte encodings exchanged with the server.
//!
//! None of these modules keeps state across protocol rounds; every secret
//! they produce is meant to live for exactly one round.

pub mod crypto;
pub mod field;
pub mod quantize;
pub mod shamir;
pub mod wire;

/// A stable positive index (`1..=total_clients`) assigned to a participant
/// for one round.
///
/// It doubles as the x-coordinate of that participant's Shamir shares and as
/// the tie-break that decides the sign of a pairwise mask.
pub type ParticipantIndex = u32;
