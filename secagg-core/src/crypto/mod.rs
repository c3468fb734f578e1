//! Cryptographic primitives of the masking protocol.
//!
//! The submodules wrap the ecosystem crates behind the small surface the
//! protocol engine needs:
//!
//! - [`agreement`]: fresh-per-round X25519 key pairs and ECDH.
//! - [`kdf`]: HKDF-SHA256 expansion, pairwise-mask and share-key derivation.
//! - [`sealed`]: AES-256-GCM encryption of Shamir shares for transport
//!   through an untrusted relay.
//! - [`prng`]: the deterministic hash-counter mask generator.
//!
//! # Examples
//! ## Deriving the same pairwise mask on both sides
//! ```
//! # use secagg_core::crypto::{derive_pairwise_mask, KeyPair};
//! let alice = KeyPair::generate();
//! let bob = KeyPair::generate();
//! let context = b"session-1/round-7/pair-1-2";
//! let ours = derive_pairwise_mask(
//!     &alice.secret.shared_secret(&bob.public), 4, 1 << 32, context).unwrap();
//! let theirs = derive_pairwise_mask(
//!     &bob.secret.shared_secret(&alice.public), 4, 1 << 32, context).unwrap();
//! assert_eq!(ours, theirs);
//! ```

pub(crate) mod agreement;
pub(crate) mod kdf;
pub(crate) mod prng;
pub(crate) mod sealed;

use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

pub use self::{
    agreement::{KeyPair, PublicKey, SecretKey, SharedSecret},
    kdf::{derive_pairwise_mask, derive_share_key, hkdf_expand},
    prng::{pseudo_rand_gen, pseudo_rand_lanes},
    sealed::{decrypt_share, encrypt_share, NONCE_LENGTH, TAG_LENGTH},
};

#[derive(Debug, Error, Eq, PartialEq)]
/// Errors related to the cryptographic primitives.
pub enum CryptoError {
    /// The ciphertext could not be authenticated. The sender must be treated
    /// as dropped; the payload is never decoded to empty or zeroed data.
    #[error("decryption failed: the ciphertext could not be authenticated")]
    Authentication,

    /// The platform cannot provide the requested primitive or output. The
    /// caller may fall back to the server-coordinated protocol variant.
    #[error("a required cryptographic capability is unavailable")]
    Unavailable,

    #[error("the modulus for mask derivation must be positive")]
    ZeroModulus,
}

/// An interface for slicing into cryptographic byte objects.
pub trait ByteObject: Sized {
    /// Length in bytes of this object.
    const LENGTH: usize;

    /// Creates a new object with all the bytes initialized to `0`.
    fn zeroed() -> Self;

    /// Gets the object byte representation.
    fn as_slice(&self) -> &[u8];

    /// Creates an object from the given buffer.
    ///
    /// # Errors
    /// Returns `None` if the length of the byte-slice isn't equal to the
    /// length of the object.
    fn from_slice(bytes: &[u8]) -> Option<Self>;

    /// Creates an object from the given buffer.
    ///
    /// # Panics
    /// Panics if the length of the byte-slice isn't equal to the length of
    /// the object.
    fn from_slice_unchecked(bytes: &[u8]) -> Self {
        Self::from_slice(bytes).unwrap()
    }

    /// Generates an object with random bytes from the operating system.
    fn generate() -> Self {
        let mut bytes = vec![0_u8; Self::LENGTH];
        OsRng.fill_bytes(&mut bytes);
        // safe unwrap: length of the slice is guaranteed by the constant
        Self::from_slice_unchecked(&bytes)
    }
}
