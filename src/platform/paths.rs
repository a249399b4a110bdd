use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::Result;

/// Required mode of the data directory.
pub const DIR_MODE: u32 = 0o700;

/// Required mode of every file inside the data directory.
pub const FILE_MODE: u32 = 0o600;

/// The directory holding the vault and its companion files.
///
/// ```text
/// <data_dir>/vault.dat       encrypted vault
/// <data_dir>/vault.dat.tmp   temporary sibling during a save
/// <data_dir>/vault.lock      advisory process lock
/// <data_dir>/audit.db        audit log
/// <data_dir>/config.toml     settings
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a possibly relative directory against the working directory.
    pub fn resolve(dir: &str) -> Result<Self> {
        let path = Path::new(dir);
        if path.is_absolute() {
            return Ok(Self::new(path));
        }
        Ok(Self::new(std::env::current_dir()?.join(path)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn vault_path(&self) -> PathBuf {
        self.root.join("vault.dat")
    }

    pub fn temp_path(&self) -> PathBuf {
        self.root.join("vault.dat.tmp")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join("vault.lock")
    }

    pub fn audit_path(&self) -> PathBuf {
        self.root.join("audit.db")
    }

    /// Create the directory, owner-only, if it does not exist yet.
    ///
    /// An existing directory is left exactly as it is; whether its mode is
    /// acceptable is decided by the permission checks before any read.
    pub fn ensure(&self) -> Result<()> {
        if self.root.is_dir() {
            return Ok(());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(DIR_MODE);
        }
        builder.create(&self.root)?;
        Ok(())
    }
}
