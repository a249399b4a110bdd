//! Atomic, permission-checked persistence of the vault blob.
//!
//! The vault is written to `vault.dat.tmp` first and renamed over
//! `vault.dat`, so readers only ever see a complete file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::{Result, VaultError};
use crate::platform::paths::{DataDir, DIR_MODE, FILE_MODE};
use crate::platform::permissions::{assert_dir_secure, assert_file_secure};
use crate::platform::LockProof;

use super::format::VaultBlob;

/// Reads and writes the single vault file inside a data directory.
#[derive(Debug, Clone)]
pub struct VaultStorage {
    dir: DataDir,
}

impl VaultStorage {
    pub fn new(dir: DataDir) -> Self {
        Self { dir }
    }

    pub fn data_dir(&self) -> &DataDir {
        &self.dir
    }

    pub fn vault_path(&self) -> PathBuf {
        self.dir.vault_path()
    }

    /// Whether a vault file is present.
    ///
    /// Creates the owner-only data directory as a side effect.
    pub fn exists(&self) -> Result<bool> {
        self.dir.ensure()?;
        Ok(self.dir.vault_path().is_file())
    }

    /// Persist `blob`, replacing any existing vault wholesale.
    ///
    /// Refuses to write into a directory others can reach.
    pub fn save(&self, blob: &VaultBlob) -> Result<()> {
        self.dir.ensure()?;
        assert_dir_secure(self.dir.root(), DIR_MODE)?;
        let bytes = blob.to_bytes()?;
        let tmp = self.dir.temp_path();

        if let Err(e) = write_then_rename(&tmp, &self.dir.vault_path(), &bytes) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        Ok(())
    }

    /// Read the vault after checking ownership and modes.
    ///
    /// Nothing is parsed if the directory or file could have been
    /// written by someone else.
    pub fn load(&self) -> Result<VaultBlob> {
        let path = self.dir.vault_path();
        if !self.dir.root().exists() || !path.exists() {
            return Err(VaultError::NotInitialized(path));
        }

        assert_dir_secure(self.dir.root(), DIR_MODE)?;
        assert_file_secure(&path, FILE_MODE)?;

        let data = fs::read(&path)?;
        VaultBlob::from_bytes(&data)
    }

    /// Delete the vault and its temp sibling, and optionally the audit log.
    ///
    /// Requires the exclusive process lock.
    pub fn purge(&self, lock: &dyn LockProof, include_auxiliary: bool) -> Result<()> {
        if !lock.is_held() {
            return Err(VaultError::LockRequired);
        }

        remove_if_present(&self.dir.vault_path())?;
        remove_if_present(&self.dir.temp_path())?;
        if include_auxiliary {
            remove_if_present(&self.dir.audit_path())?;
        }
        Ok(())
    }
}

fn write_then_rename(tmp: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }

    let mut file = options.open(tmp)?;

    // A stale temp file keeps its old mode, so force it.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(FILE_MODE))?;
    }

    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);

    fs::rename(tmp, target)?;
    Ok(())
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{hash_master, KdfLevel, NONCE_LEN};
    use crate::vault::format::{KdfParams, VaultHeader};
    use tempfile::TempDir;

    struct Held(bool);

    impl LockProof for Held {
        fn is_held(&self) -> bool {
            self.0
        }
    }

    fn blob() -> VaultBlob {
        let header = VaultHeader::create(
            KdfParams::generate(KdfLevel::Light),
            hash_master(b"Secret123").unwrap(),
        )
        .unwrap();
        VaultBlob::new(header, &[7u8; NONCE_LEN], vec![1, 2, 3, 4]).unwrap()
    }

    fn storage(tmp: &TempDir) -> VaultStorage {
        VaultStorage::new(DataDir::new(tmp.path().join("data")))
    }

    #[test]
    fn exists_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let store = storage(&tmp);
        assert!(!store.exists().unwrap());
        assert!(tmp.path().join("data").is_dir());
    }

    #[test]
    fn save_then_load_returns_same_blob() {
        let tmp = TempDir::new().unwrap();
        let store = storage(&tmp);
        let original = blob();

        store.save(&original).unwrap();
        assert!(store.exists().unwrap());
        assert!(!store.data_dir().temp_path().exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn load_without_vault_is_not_initialized() {
        let tmp = TempDir::new().unwrap();
        let err = storage(&tmp).load().unwrap_err();
        assert!(matches!(err, VaultError::NotInitialized(_)));
    }

    #[test]
    fn load_rejects_garbage() {
        let tmp = TempDir::new().unwrap();
        let store = storage(&tmp);
        store.save(&blob()).unwrap();
        fs::write(store.vault_path(), b"{ not json").unwrap();

        assert!(matches!(store.load(), Err(VaultError::CorruptBlob(_))));
    }

    #[test]
    fn save_overwrites_stale_temp_file() {
        let tmp = TempDir::new().unwrap();
        let store = storage(&tmp);
        store.exists().unwrap();
        fs::write(store.data_dir().temp_path(), b"leftover").unwrap();

        store.save(&blob()).unwrap();
        assert!(!store.data_dir().temp_path().exists());
        assert!(store.load().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = storage(&tmp);
        store.save(&blob()).unwrap();

        let mode = fs::metadata(store.vault_path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn load_refuses_readable_file() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = storage(&tmp);
        store.save(&blob()).unwrap();
        fs::set_permissions(store.vault_path(), fs::Permissions::from_mode(0o644)).unwrap();

        assert!(matches!(
            store.load(),
            Err(VaultError::InsecurePermissions(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn load_refuses_open_directory() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = storage(&tmp);
        store.save(&blob()).unwrap();
        fs::set_permissions(store.data_dir().root(), fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(
            store.load(),
            Err(VaultError::InsecurePermissions(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn open_directory_is_not_repaired() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let store = storage(&tmp);
        store.save(&blob()).unwrap();
        fs::set_permissions(store.data_dir().root(), fs::Permissions::from_mode(0o755)).unwrap();

        assert!(store.exists().unwrap());
        assert!(matches!(
            store.save(&blob()),
            Err(VaultError::InsecurePermissions(_))
        ));
        assert!(matches!(
            store.load(),
            Err(VaultError::InsecurePermissions(_))
        ));
        let mode = fs::metadata(store.data_dir().root()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn purge_requires_lock() {
        let tmp = TempDir::new().unwrap();
        let store = storage(&tmp);
        store.save(&blob()).unwrap();

        assert!(matches!(
            store.purge(&Held(false), true),
            Err(VaultError::LockRequired)
        ));
        assert!(store.vault_path().exists());
    }

    #[test]
    fn purge_removes_vault_and_optionally_audit() {
        let tmp = TempDir::new().unwrap();
        let store = storage(&tmp);
        store.save(&blob()).unwrap();
        let audit = store.data_dir().audit_path();
        fs::write(&audit, b"db").unwrap();

        store.purge(&Held(true), false).unwrap();
        assert!(!store.vault_path().exists());
        assert!(audit.exists());

        store.purge(&Held(true), true).unwrap();
        assert!(!audit.exists());
    }
}
