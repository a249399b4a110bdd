//! Ownership and mode checks run before the vault is read.
//!
//! A vault that someone else could have written to cannot be trusted,
//! so any mode broader than required, or a foreign owner, is a hard
//! refusal.

use std::fs;
use std::path::Path;

use crate::errors::{Result, VaultError};

/// The directory must exist, belong to us, and be no broader than `required`.
pub fn assert_dir_secure(dir: &Path, required: u32) -> Result<()> {
    let meta = fs::metadata(dir).map_err(|_| {
        VaultError::InsecurePermissions(format!("data directory {} is missing", dir.display()))
    })?;
    if !meta.is_dir() {
        return Err(VaultError::InsecurePermissions(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    check(dir, &meta, required)
}

/// The file must belong to us and be no broader than `required`.
pub fn assert_file_secure(path: &Path, required: u32) -> Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if !meta.is_file() {
        return Err(VaultError::InsecurePermissions(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    check(path, &meta, required)
}

#[cfg(unix)]
fn check(path: &Path, meta: &fs::Metadata, required: u32) -> Result<()> {
    use std::os::unix::fs::MetadataExt;

    let euid = nix::unistd::geteuid().as_raw();
    if meta.uid() != euid {
        return Err(VaultError::InsecurePermissions(format!(
            "{} is owned by uid {}, not {euid}",
            path.display(),
            meta.uid()
        )));
    }

    let mode = meta.mode() & 0o777;
    if mode | required != required {
        return Err(VaultError::InsecurePermissions(format!(
            "{} has mode {mode:o}, must be at most {required:o}",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(not(unix))]
fn check(_path: &Path, _meta: &fs::Metadata, _required: u32) -> Result<()> {
    Ok(())
}
