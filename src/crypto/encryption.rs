//! AES-256-GCM authenticated encryption with associated data.
//!
//! Callers own the nonce: it is stored next to the ciphertext in the
//! vault file and must be freshly drawn for every encryption under the
//! same key.  The associated data is authenticated but not encrypted,
//! so any change to it makes `decrypt` fail.
//!
//! Layout of the returned ciphertext:
//!   [ ciphertext | 16-byte auth tag ]

use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};

use super::keys::VaultKey;

/// Size of the AES-256-GCM nonce in bytes, taken from the cipher itself.
pub const NONCE_LEN: usize = <<Aes256Gcm as AeadCore>::NonceSize as Unsigned>::USIZE;

/// Size of the authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = <<Aes256Gcm as AeadCore>::TagSize as Unsigned>::USIZE;

/// Encrypt `plaintext` under `key` and `nonce`, binding `aad`.
pub fn encrypt(plaintext: &[u8], key: &VaultKey, nonce: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    if nonce.len() != NONCE_LEN {
        return Err(VaultError::EncryptionFailed(format!(
            "nonce must be {NONCE_LEN} bytes, got {}",
            nonce.len()
        )));
    }

    // Build the cipher from the raw key bytes.
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| VaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| VaultError::EncryptionFailed(format!("encryption error: {e}")))
}

/// Decrypt data produced by `encrypt` with the same key, nonce and aad.
///
/// Every failure (wrong key, wrong nonce, wrong aad, modified bytes)
/// returns the same `DecryptionFailed`.
pub fn decrypt(
    ciphertext: &[u8],
    key: &VaultKey,
    nonce: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    if nonce.len() != NONCE_LEN || ciphertext.len() < TAG_LEN {
        return Err(VaultError::DecryptionFailed);
    }

    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| VaultError::DecryptionFailed)?;

    // Decrypt and verify the auth tag.
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| VaultError::DecryptionFailed)?;

    Ok(Zeroizing::new(plaintext))
}

/// Draw a fresh random nonce.
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);
    nonce
}
