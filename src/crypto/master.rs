//! Master password hashing for authentication.
//!
//! The stored hash is an Argon2id PHC string with its own random salt.
//! It only answers "is this the right password?" and is never used as
//! key material; the encryption key comes from `kdf::derive_key` with a
//! separate salt.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;

use crate::errors::{Result, VaultError};

/// Salt length for the authentication hash, in bytes.
const HASH_SALT_LEN: usize = 16;

/// Hash the master password into a PHC string (`$argon2id$v=19$...`).
pub fn hash_master(password: &[u8]) -> Result<String> {
    let mut raw_salt = [0u8; HASH_SALT_LEN];
    rand::rng().fill_bytes(&mut raw_salt);
    let salt = SaltString::encode_b64(&raw_salt)
        .map_err(|e| VaultError::HashingFailed(format!("salt encoding: {e}")))?;

    let hash = Argon2::default()
        .hash_password(password, &salt)
        .map_err(|e| VaultError::HashingFailed(e.to_string()))?;

    Ok(hash.to_string())
}

/// Check `password` against a stored hash.
///
/// An unparseable or foreign hash simply fails verification; callers
/// cannot tell it apart from a wrong password.
pub fn verify_master(password: &[u8], hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    if !is_argon2_id(parsed.algorithm.as_str()) {
        return false;
    }
    Argon2::default().verify_password(password, &parsed).is_ok()
}

/// Returns `true` if `hash` parses as a PHC string from the Argon2 family.
pub fn is_recognized_hash(hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| is_argon2_id(parsed.algorithm.as_str()))
        .unwrap_or(false)
}

fn is_argon2_id(ident: &str) -> bool {
    matches!(ident, "argon2id" | "argon2i" | "argon2d")
}
