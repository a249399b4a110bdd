//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - Argon2id master password hashing for authentication (`master`)
//! - Argon2id password-based key derivation (`kdf`)
//! - AES-256-GCM encryption and decryption with associated data (`encryption`)
//! - The zeroizing `VaultKey` holder (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;
pub mod master;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt, generate_nonce, NONCE_LEN};
pub use kdf::{derive_key, derive_key_with_costs, generate_salt, KdfLevel, SALT_LEN};
pub use keys::VaultKey;
pub use master::{hash_master, is_recognized_hash, verify_master};

