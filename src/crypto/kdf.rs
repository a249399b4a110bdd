//! Password-based key derivation using Argon2id.
//!
//! Argon2id is a memory-hard KDF that protects against brute-force and
//! GPU-based attacks.  The vault stores a named cost level rather than raw
//! numbers; each level maps to a fixed (iterations, memory) preset.

use std::fmt;
use std::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, VaultError};

use super::keys::{VaultKey, KEY_LEN};

/// Length of the KDF salt in bytes, as recommended by the argon2 crate.
pub const SALT_LEN: usize = argon2::RECOMMENDED_SALT_LEN;

/// The only KDF algorithm name accepted in a vault header.
pub const KDF_ALGORITHM: &str = "argon2id";

/// Named Argon2id cost preset.
///
/// The presets follow the usual interactive / moderate / sensitive
/// split used by password managers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KdfLevel {
    Light,
    #[default]
    Medium,
    Heavy,
}

impl KdfLevel {
    /// Argon2 iteration count (time cost) for this level.
    pub fn iterations(self) -> u32 {
        match self {
            Self::Light => 2,
            Self::Medium => 3,
            Self::Heavy => 4,
        }
    }

    /// Argon2 memory cost in KiB for this level.
    pub fn memory_kib(self) -> u32 {
        match self {
            Self::Light => 64 * 1024,   // 64 MiB
            Self::Medium => 256 * 1024, // 256 MiB
            Self::Heavy => 1024 * 1024, // 1 GiB
        }
    }

    /// The name stored in the vault header.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "LIGHT",
            Self::Medium => "MEDIUM",
            Self::Heavy => "HEAVY",
        }
    }
}

impl fmt::Display for KdfLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KdfLevel {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LIGHT" => Ok(Self::Light),
            "MEDIUM" => Ok(Self::Medium),
            "HEAVY" => Ok(Self::Heavy),
            other => Err(VaultError::CorruptHeader(format!(
                "unknown KDF level '{other}'"
            ))),
        }
    }
}

/// Derive the vault encryption key, using one level for both costs.
pub fn derive_key(password: &[u8], salt: &[u8], level: KdfLevel) -> Result<VaultKey> {
    derive_key_with_costs(password, salt, level, level)
}

/// Derive the vault encryption key with separate time and memory levels.
///
/// The same password + salt + levels always produce the same key.
/// Fails with `InvalidSalt` when the salt is not exactly `SALT_LEN` bytes.
pub fn derive_key_with_costs(
    password: &[u8],
    salt: &[u8],
    ops: KdfLevel,
    mem: KdfLevel,
) -> Result<VaultKey> {
    if salt.len() != SALT_LEN {
        return Err(VaultError::InvalidSalt {
            expected: SALT_LEN,
            actual: salt.len(),
        });
    }

    let params = Params::new(mem.memory_kib(), ops.iterations(), 1, Some(KEY_LEN))
        .map_err(|e| VaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = VaultKey::zeroed();
    argon2
        .hash_password_into(password, salt, key.as_mut_bytes())
        .map_err(|e| VaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;

    Ok(key)
}

/// Generate a cryptographically random KDF salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
