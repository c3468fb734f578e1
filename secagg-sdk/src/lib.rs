//! # SecAgg+ client engine
//!
//! This crate drives one device's participation in one secure-aggregation
//! round. The [`SecAggClient`] state machine sequences the `secagg-core`
//! primitives through four strictly ordered stages: key exchange, encrypted
//! share distribution, masked-vector submission and dropout recovery. The
//! [`simplified`] module offers the server-coordinated variant without
//! pairwise exchange.
//!
//! The engine owns nothing outside its round: construct one instance per
//! round, drive it to completion or abandon it. Network exchange of the
//! artifacts it produces is the caller's responsibility; every artifact is
//! fully computed when returned and safe to resend.

mod engine;
mod settings;
pub mod simplified;

pub use self::{
    engine::{EngineError, SecAggClient, Stage},
    settings::{InvalidRoundContext, RoundContext},
};
