//! Byte encodings exchanged with the server.
//!
//! Two formats live here, both big-endian and matched exactly to the
//! server's parsers:
//!
//! - [`masked`]: masked vectors as concatenated 4-byte field-element lanes.
//! - [`share_bundle`]: the simplified-path bundle of serialized Shamir
//!   shares, and the record format sealed into AEAD blobs on the pairwise
//!   path.

pub(crate) mod masked;
pub(crate) mod share_bundle;

pub use self::{
    masked::{bytes_to_lanes, lanes_to_bytes, LANE_LENGTH, LANE_MODULUS},
    share_bundle::{decode_share, encode_share, ShareBundle, SHARE_RECORD_LENGTH},
};

/// An opaque error returned when decoding a wire payload fails.
pub type DecodeError = anyhow::Error;
