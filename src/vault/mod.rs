//! The vault: on-disk format, storage, transactions and entry CRUD.
//!
//! - `format`: header, KDF parameters and the encrypted blob
//! - `entry`: credential entries and the decrypted payload
//! - `storage`: atomic, permission-checked file I/O
//! - `access`: the unlock / operate / reseal transaction
//! - `repository`: pure operations over the entry collection

pub mod access;
pub mod entry;
pub mod format;
pub mod repository;
pub mod storage;

pub use access::{AccessMode, Change, Outcome, UnlockedVault, VaultAccess};
pub use entry::{CredentialEntry, CredentialInput};
pub use format::{KdfParams, VaultBlob, VaultHeader, CURRENT_VERSION};
pub use repository::EntryChanges;
pub use storage::VaultStorage;
