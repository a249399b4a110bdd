//! Exclusive advisory lock on `<data_dir>/vault.lock`.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::errors::{Result, VaultError};

/// Evidence that the caller holds the exclusive vault lock.
///
/// `VaultStorage::purge` refuses to run without it.
pub trait LockProof {
    fn is_held(&self) -> bool;
}

/// An exclusive, non-blocking OS file lock held for the lifetime of the value.
#[derive(Debug)]
pub struct ProcessLock {
    file: Option<File>,
    path: PathBuf,
}

impl ProcessLock {
    /// Take the lock, failing `LockUnavailable` if another process has it.
    pub fn acquire(path: &Path) -> Result<Self> {
        let mut options = OpenOptions::new();
        options.read(true).write(true).create(true).truncate(false);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(super::paths::FILE_MODE);
        }
        let file = options.open(path)?;

        try_lock(&file)?;

        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release early. Dropping the value does the same.
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            unlock(&file);
        }
    }
}

impl LockProof for ProcessLock {
    fn is_held(&self) -> bool {
        self.file.is_some()
    }
}

impl Drop for ProcessLock {
    fn drop(&mut self) {
        self.release();
    }
}

fn try_lock(file: &File) -> Result<()> {
    loop {
        match file.try_lock_exclusive() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.raw_os_error() == fs2::lock_contended_error().raw_os_error() =>
            {
                return Err(VaultError::LockUnavailable)
            }
            Err(err) => return Err(VaultError::Io(err)),
        }
    }
}

fn unlock(file: &File) {
    // Closing the file releases the lock too, so a failure here is moot.
    let _ = FileExt::unlock(file);
}
