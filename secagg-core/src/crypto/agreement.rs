//! X25519 key agreement.
//!
//! See the [crypto module] documentation since this is a private module
//! anyways.
//!
//! [crypto module]: crate::crypto

use derive_more::{AsMut, AsRef, From};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::StaticSecret;

use super::ByteObject;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// An `X25519` key pair for pairwise key agreement.
///
/// A pair is generated fresh for every round and never persisted or reused.
pub struct KeyPair {
    /// The `X25519` public key.
    pub public: PublicKey,
    /// The `X25519` secret key.
    pub secret: SecretKey,
}

impl KeyPair {
    /// Generates a new random `X25519` key pair.
    pub fn generate() -> Self {
        let secret = SecretKey(StaticSecret::random_from_rng(OsRng).to_bytes());
        Self {
            public: secret.public_key(),
            secret,
        }
    }
}

#[derive(
    AsRef,
    AsMut,
    From,
    Serialize,
    Deserialize,
    Hash,
    Eq,
    Ord,
    PartialEq,
    Copy,
    Clone,
    PartialOrd,
    Debug,
)]
/// An `X25519` public key.
pub struct PublicKey([u8; PublicKey::LENGTH]);

impl ByteObject for PublicKey {
    const LENGTH: usize = 32;

    fn zeroed() -> Self {
        Self([0_u8; Self::LENGTH])
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        use std::convert::TryInto;
        bytes.try_into().ok().map(Self)
    }
}

#[derive(AsRef, AsMut, From, Serialize, Deserialize, Eq, PartialEq, Clone, Debug)]
/// An `X25519` secret key.
pub struct SecretKey([u8; SecretKey::LENGTH]);

impl SecretKey {
    /// Computes the corresponding public key for this secret key.
    pub fn public_key(&self) -> PublicKey {
        let public = x25519_dalek::PublicKey::from(&StaticSecret::from(self.0));
        PublicKey(*public.as_bytes())
    }

    /// Computes the shared secret with a peer via Diffie-Hellman.
    ///
    /// The result is symmetric for a pair: `a.shared_secret(&b_pub)` equals
    /// `b.shared_secret(&a_pub)`, and differs for any other peer. It is only
    /// used to derive that pair's mask and share-encryption key, and is
    /// dropped with the round.
    pub fn shared_secret(&self, peer: &PublicKey) -> SharedSecret {
        let secret = StaticSecret::from(self.0);
        let peer = x25519_dalek::PublicKey::from(peer.0);
        SharedSecret(*secret.diffie_hellman(&peer).as_bytes())
    }
}

impl ByteObject for SecretKey {
    const LENGTH: usize = 32;

    fn zeroed() -> Self {
        Self([0_u8; Self::LENGTH])
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        use std::convert::TryInto;
        bytes.try_into().ok().map(Self)
    }
}

#[derive(AsRef, AsMut, From, Eq, PartialEq, Clone, Debug)]
/// A 32-byte symmetric secret agreed between one ordered pair of
/// participants for one round.
pub struct SharedSecret([u8; SharedSecret::LENGTH]);

impl ByteObject for SharedSecret {
    const LENGTH: usize = 32;

    fn zeroed() -> Self {
        Self([0_u8; Self::LENGTH])
    }

    fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    fn from_slice(bytes: &[u8]) -> Option<Self> {
        use std::convert::TryInto;
        bytes.try_into().ok().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dh_symmetry() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let ours = alice.secret.shared_secret(&bob.public);
        let theirs = bob.secret.shared_secret(&alice.public);
        assert_eq!(ours, theirs);
    }

    #[test]
    fn test_dh_distinct_for_other_peers() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let eve = KeyPair::generate();
        assert_ne!(
            alice.secret.shared_secret(&bob.public),
            alice.secret.shared_secret(&eve.public),
        );
    }

    #[test]
    fn test_fresh_key_pairs() {
        assert_ne!(KeyPair::generate().public, KeyPair::generate().public);
    }

    #[test]
    fn test_byte_object() {
        let keys = KeyPair::generate();
        let roundtrip = PublicKey::from_slice(keys.public.as_slice()).unwrap();
        assert_eq!(roundtrip, keys.public);
        assert!(PublicKey::from_slice(&[0_u8; 31]).is_none());
        assert_eq!(PublicKey::zeroed().as_slice(), &[0_u8; 32][..]);
    }

    #[test]
    fn test_public_key_derivation_is_stable() {
        let keys = KeyPair::generate();
        assert_eq!(keys.secret.public_key(), keys.public);
    }
}
