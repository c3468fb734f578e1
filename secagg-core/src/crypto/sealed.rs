//! AES-256-GCM share transport.
//!
//! Shamir shares travel through an untrusted relay, so they are sealed under
//! a key only the two endpoints can derive. The wire layout is
//! `nonce (12) ‖ ciphertext ‖ tag (16)` with a fresh random nonce per call.
//!
//! See the [crypto module] documentation since this is a private module
//! anyways.
//!
//! [crypto module]: crate::crypto

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm,
    Key,
    Nonce,
};
use rand::{rngs::OsRng, RngCore};

use super::CryptoError;

/// Length in bytes of the nonce prefixed to every sealed share.
pub const NONCE_LENGTH: usize = 12;

/// Length in bytes of the authentication tag appended by AES-GCM.
pub const TAG_LENGTH: usize = 16;

/// Encrypts a serialized share under the given pairwise key.
///
/// Every call draws a fresh random nonce, so resealing the same plaintext
/// yields a different blob.
pub fn encrypt_share(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut nonce = [0_u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::Unavailable)?;
    let mut sealed = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypts a sealed share.
///
/// # Errors
/// Fails with [`CryptoError::Authentication`] if the key is wrong or the
/// nonce, ciphertext or tag were altered. A failed decryption never yields
/// partial or zeroed plaintext.
pub fn decrypt_share(key: &[u8; 32], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < NONCE_LENGTH + TAG_LENGTH {
        return Err(CryptoError::Authentication);
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_LENGTH);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::Authentication)
}
