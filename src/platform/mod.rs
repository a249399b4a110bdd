//! Filesystem-level plumbing: where the vault lives, who may read it,
//! and the advisory lock that guards destructive operations.

pub mod lock;
pub mod paths;
pub mod permissions;

pub use lock::{LockProof, ProcessLock};
pub use paths::DataDir;
