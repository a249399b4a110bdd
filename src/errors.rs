use std::path::PathBuf;
use thiserror::Error;

use crate::validation::ValidationError;

/// All errors that can occur in CredVault.
#[derive(Debug, Error)]
pub enum VaultError {
    // --- Lifecycle errors ---
    #[error("Vault not initialized at {0}; run `credvault init` first")]
    NotInitialized(PathBuf),

    #[error("Vault already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The one outward failure for everything that went wrong inside an
    /// unlocked transaction. The specific cause only reaches the audit log.
    #[error("Unable to access vault")]
    AccessFailed,

    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Invalid KDF salt: expected {expected} bytes, got {actual}")]
    InvalidSalt { expected: usize, actual: usize },

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    // --- Model / storage errors ---
    #[error("Corrupt vault header: {0}")]
    CorruptHeader(String),

    #[error("Corrupt vault file: {0}")]
    CorruptBlob(String),

    #[error("Insecure permissions: {0}")]
    InsecurePermissions(String),

    #[error("Exclusive vault lock required for this operation")]
    LockRequired,

    #[error("Vault is locked by another process")]
    LockUnavailable,

    // --- Repository errors ---
    #[error("Entry '{0}' not found")]
    NotFound(String),

    #[error("Nothing to update")]
    NothingToUpdate,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- Audit errors ---
    #[error("Audit error: {0}")]
    AuditError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),
}

impl VaultError {
    /// Short machine-readable reason used as audit context.
    ///
    /// Never contains user data.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotInitialized(_) => "not_initialized",
            Self::AlreadyInitialized(_) => "already_initialized",
            Self::InvalidCredentials => "invalid_credentials",
            Self::AccessFailed => "access_failed",
            Self::EncryptionFailed(_) => "encryption_failed",
            Self::DecryptionFailed => "decryption_failed",
            Self::KeyDerivationFailed(_) => "key_derivation_failed",
            Self::InvalidSalt { .. } => "invalid_salt",
            Self::HashingFailed(_) => "hashing_failed",
            Self::CorruptHeader(_) => "corrupt_header",
            Self::CorruptBlob(_) => "corrupt_blob",
            Self::InsecurePermissions(_) => "insecure_permissions",
            Self::LockRequired => "lock_required",
            Self::LockUnavailable => "lock_unavailable",
            Self::NotFound(_) => "not_found",
            Self::NothingToUpdate => "nothing_to_update",
            Self::Validation(_) => "validation",
            Self::ConfigError(_) => "config",
            Self::Io(_) => "io",
            Self::SerializationError(_) => "serialization",
            Self::AuditError(_) => "audit",
            Self::CommandFailed(_) => "command_failed",
        }
    }
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, VaultError>;
