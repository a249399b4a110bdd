//! Unlock, run one operation, reseal, relock.
//!
//! `VaultAccess::with_unlocked` is the only way to reach decrypted
//! entries.  The operation gets a borrowed `UnlockedVault` and answers
//! with an `Outcome` saying whether the collection changed.  Whatever
//! happens, the derived key, the master password and every plaintext
//! buffer are wiped before `with_unlocked` returns, and a `vault.lock`
//! audit record is written.
//!
//! Failures inside the transaction are collapsed into
//! `VaultError::AccessFailed`; the real reason only goes to the audit
//! sink.  `NotInitialized` and `InvalidCredentials` stay distinct, and
//! errors returned by the operation itself are passed through unchanged.

use zeroize::Zeroizing;

use crate::audit::{events, AuditOutcome, AuditSink};
use crate::crypto::{
    decrypt, derive_key, derive_key_with_costs, encrypt, generate_nonce, hash_master,
    verify_master, KdfLevel, VaultKey,
};
use crate::errors::{Result, VaultError};
use crate::platform::LockProof;

use super::entry::{serialize_payload, CredentialEntry, RawPayload};
use super::format::{KdfParams, VaultBlob, VaultHeader};
use super::repository;
use super::storage::VaultStorage;

/// Whether a transaction that changed nothing still rewrites the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Persist only when the operation replaces the collection.
    Standard,
    /// Always re-encrypt under a fresh nonce, even on a pure read.
    /// Used by paths that reveal secret material.
    ReadReseal,
}

/// What the operation did to the entry collection.
pub enum Change {
    NoChange,
    Replace(Vec<CredentialEntry>),
}

/// The result of an operation run inside a transaction.
pub struct Outcome<T> {
    pub change: Change,
    pub value: T,
}

impl<T> Outcome<T> {
    pub fn unchanged(value: T) -> Self {
        Self {
            change: Change::NoChange,
            value,
        }
    }

    pub fn replace(entries: Vec<CredentialEntry>, value: T) -> Self {
        Self {
            change: Change::Replace(entries),
            value,
        }
    }
}

/// Decrypted vault contents, alive only for one transaction.
///
/// Holds the derived key and the decrypted payload; both are wiped when
/// the value is dropped at the end of `with_unlocked`.
pub struct UnlockedVault {
    header: VaultHeader,
    entries: Vec<CredentialEntry>,
    key: VaultKey,
    plaintext: Zeroizing<Vec<u8>>,
}

impl UnlockedVault {
    pub fn header(&self) -> &VaultHeader {
        &self.header
    }

    pub fn entries(&self) -> &[CredentialEntry] {
        &self.entries
    }
}

/// Runs vault transactions against one storage location.
pub struct VaultAccess<'a> {
    storage: VaultStorage,
    audit: &'a dyn AuditSink,
}

impl<'a> VaultAccess<'a> {
    pub fn new(storage: VaultStorage, audit: &'a dyn AuditSink) -> Self {
        Self { storage, audit }
    }

    pub fn storage(&self) -> &VaultStorage {
        &self.storage
    }

    /// Whether a vault file exists.
    pub fn is_initialized(&self) -> Result<bool> {
        self.storage.exists()
    }

    /// Fail `NotInitialized` when there is no vault yet.
    ///
    /// Callers run this before asking for the master password, so nobody
    /// types a secret for a vault that does not exist.
    pub fn require_initialized(&self) -> Result<()> {
        if self.storage.exists()? {
            return Ok(());
        }
        Err(self.access_failure(VaultError::NotInitialized(
            self.storage.vault_path(),
        )))
    }

    /// Create an empty vault protected by `master`.
    ///
    /// Fails `AlreadyInitialized` if a vault is already present.
    pub fn initialize(&self, master: Zeroizing<String>, level: KdfLevel) -> Result<VaultHeader> {
        if self.storage.exists()? {
            self.audit.record(
                events::VAULT_INIT_FAIL,
                AuditOutcome::Failure,
                events::INIT_EXISTS,
                &[("reason", "already_initialized")],
            );
            return Err(VaultError::AlreadyInitialized(self.storage.vault_path()));
        }

        match self.create(&master, level) {
            Ok(header) => {
                let vault_id = header.vault_id().to_string();
                self.audit.record(
                    events::VAULT_INIT,
                    AuditOutcome::Success,
                    events::OK,
                    &[("vault_id", &vault_id), ("kdf", level.as_str())],
                );
                Ok(header)
            }
            Err(e) => {
                self.audit.record(
                    events::VAULT_INIT_FAIL,
                    AuditOutcome::Failure,
                    events::INIT_ERROR,
                    &[("reason", e.reason())],
                );
                Err(e)
            }
        }
    }

    fn create(&self, master: &str, level: KdfLevel) -> Result<VaultHeader> {
        let master_hash = hash_master(master.as_bytes())?;
        let kdf = KdfParams::generate(level);
        let key = derive_key(master.as_bytes(), kdf.salt(), level)?;
        let header = VaultHeader::create(kdf, master_hash)?;

        let payload = serialize_payload(&[])?;
        let blob = seal(&header, &key, &payload)?;
        self.storage.save(&blob)?;
        Ok(header)
    }

    /// Check `master` against the vault without changing anything.
    pub fn authenticate(&self, master: Zeroizing<String>) -> Result<VaultHeader> {
        self.with_unlocked(master, AccessMode::Standard, |vault| {
            Ok(Outcome::unchanged(vault.header().clone()))
        })
    }

    /// Run `op` against the decrypted vault.
    ///
    /// When `op` returns `Change::Replace`, the new collection is sealed
    /// under a refreshed header and a fresh nonce and saved.  In
    /// `ReadReseal` mode an unchanged collection is re-encrypted under a
    /// fresh nonce and saved too.  A wrong password never writes.
    pub fn with_unlocked<T, F>(
        &self,
        master: Zeroizing<String>,
        mode: AccessMode,
        op: F,
    ) -> Result<T>
    where
        F: FnOnce(&UnlockedVault) -> Result<Outcome<T>>,
    {
        let result = match self.transact(master, mode, op) {
            Ok(op_result) => op_result,
            Err(e) => Err(self.access_failure(e)),
        };
        self.audit
            .record(events::VAULT_LOCK, AuditOutcome::Info, events::OK, &[]);
        result
    }

    /// The outer `Result` carries transaction failures, the inner one the
    /// operation's own result.
    fn transact<T, F>(
        &self,
        master: Zeroizing<String>,
        mode: AccessMode,
        op: F,
    ) -> Result<Result<T>>
    where
        F: FnOnce(&UnlockedVault) -> Result<Outcome<T>>,
    {
        let blob = self.storage.load()?;
        let header = blob.header().clone();

        if !verify_master(master.as_bytes(), header.master_hash()) {
            return Err(VaultError::InvalidCredentials);
        }

        let kdf = header.kdf();
        let key = derive_key_with_costs(
            master.as_bytes(),
            kdf.salt(),
            kdf.ops_level(),
            kdf.mem_level(),
        )?;
        drop(master);

        let aad = header.digest()?;
        let plaintext = decrypt(blob.ciphertext(), &key, blob.nonce(), &aad)?;
        let entries = repository::normalize(RawPayload::parse(&plaintext)?);

        let count = entries.len().to_string();
        self.audit.record(
            events::VAULT_ACCESS,
            AuditOutcome::Success,
            events::OK,
            &[("entries", &count)],
        );

        let vault = UnlockedVault {
            header,
            entries,
            key,
            plaintext,
        };

        let Outcome { change, value } = match op(&vault) {
            Ok(outcome) => outcome,
            Err(e) => return Ok(Err(e)),
        };

        match change {
            Change::Replace(next) => {
                let payload = serialize_payload(&next)?;
                let header = vault.header.with_updated_now();
                self.storage.save(&seal(&header, &vault.key, &payload)?)?;
            }
            Change::NoChange if mode == AccessMode::ReadReseal => {
                self.storage
                    .save(&seal(&vault.header, &vault.key, &vault.plaintext)?)?;
            }
            Change::NoChange => {}
        }

        Ok(Ok(value))
    }

    fn access_failure(&self, err: VaultError) -> VaultError {
        match err {
            VaultError::NotInitialized(_) => {
                self.audit.record(
                    events::VAULT_ACCESS_FAIL,
                    AuditOutcome::Failure,
                    events::NOT_INITIALIZED,
                    &[("reason", err.reason())],
                );
                err
            }
            VaultError::InvalidCredentials => {
                self.audit.record(
                    events::VAULT_ACCESS_FAIL,
                    AuditOutcome::Failure,
                    events::INVALID_CREDENTIALS,
                    &[("reason", err.reason())],
                );
                err
            }
            other => {
                self.audit.record(
                    events::VAULT_ACCESS_FAIL,
                    AuditOutcome::Failure,
                    events::ACCESS_ERROR,
                    &[("reason", other.reason())],
                );
                VaultError::AccessFailed
            }
        }
    }

    /// Delete the vault, optionally with its audit log.
    ///
    /// Needs the exclusive process lock.
    pub fn purge(&self, lock: &dyn LockProof, include_auxiliary: bool) -> Result<()> {
        let scope = if include_auxiliary { "all" } else { "vault" };
        self.audit.record(
            events::VAULT_PURGE_START,
            AuditOutcome::Info,
            events::OK,
            &[("scope", scope)],
        );

        let result = self.storage.purge(lock, include_auxiliary);
        if let Err(e) = &result {
            let code = match e {
                VaultError::LockRequired => events::PURGE_LOCK_REQUIRED,
                _ => events::PURGE_ERROR,
            };
            self.audit.record(
                events::VAULT_PURGE_FAIL,
                AuditOutcome::Failure,
                code,
                &[("reason", e.reason())],
            );
        }
        result
    }
}

/// Encrypt `payload` under `header` with a fresh nonce.
fn seal(header: &VaultHeader, key: &VaultKey, payload: &[u8]) -> Result<VaultBlob> {
    let aad = header.digest()?;
    let nonce = generate_nonce();
    let ciphertext = encrypt(payload, key, &nonce, &aad)?;
    VaultBlob::new(header.clone(), &nonce, ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::DataDir;
    use crate::vault::entry::CredentialInput;
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<(String, u16)>>);

    impl AuditSink for Recorder {
        fn record(&self, event: &str, _: AuditOutcome, code: u16, _: &[(&str, &str)]) {
            self.0.borrow_mut().push((event.to_string(), code));
        }
    }

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.0.borrow().iter().map(|(e, _)| e.clone()).collect()
        }

        fn has(&self, event: &str, code: u16) -> bool {
            self.0.borrow().iter().any(|(e, c)| e == event && *c == code)
        }
    }

    fn pw(s: &str) -> Zeroizing<String> {
        Zeroizing::new(s.to_string())
    }

    fn access<'a>(tmp: &TempDir, audit: &'a Recorder) -> VaultAccess<'a> {
        VaultAccess::new(
            VaultStorage::new(DataDir::new(tmp.path().join("data"))),
            audit,
        )
    }

    fn add_github(access: &VaultAccess<'_>) -> CredentialEntry {
        let input = CredentialInput::new(
            "github.com".into(),
            "alice".into(),
            "p@ss".into(),
            String::new(),
        );
        access
            .with_unlocked(pw("Secret123"), AccessMode::Standard, |vault| {
                let (next, created) = repository::add(vault.entries(), &input);
                Ok(Outcome::replace(next, created))
            })
            .unwrap()
    }

    #[test]
    fn initialize_creates_empty_vault() {
        let tmp = TempDir::new().unwrap();
        let audit = Recorder::default();
        let access = access(&tmp, &audit);

        let header = access.initialize(pw("Secret123"), KdfLevel::Light).unwrap();
        assert_eq!(header.kdf().ops_level(), KdfLevel::Light);
        assert!(access.is_initialized().unwrap());

        let count = access
            .with_unlocked(pw("Secret123"), AccessMode::Standard, |v| {
                Ok(Outcome::unchanged(v.entries().len()))
            })
            .unwrap();
        assert_eq!(count, 0);
        assert!(audit.has(events::VAULT_INIT, events::OK));
    }

    #[test]
    fn initialize_twice_fails() {
        let tmp = TempDir::new().unwrap();
        let audit = Recorder::default();
        let access = access(&tmp, &audit);

        access.initialize(pw("Secret123"), KdfLevel::Light).unwrap();
        let err = access.initialize(pw("Other123"), KdfLevel::Light).unwrap_err();
        assert!(matches!(err, VaultError::AlreadyInitialized(_)));
        assert!(audit.has(events::VAULT_INIT_FAIL, events::INIT_EXISTS));
    }

    #[test]
    fn added_entry_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let audit = Recorder::default();
        let access = access(&tmp, &audit);
        access.initialize(pw("Secret123"), KdfLevel::Light).unwrap();

        let created = add_github(&access);
        assert_eq!(created.service, "github.com");

        let found = access
            .with_unlocked(pw("Secret123"), AccessMode::Standard, |v| {
                Ok(Outcome::unchanged(repository::get_by_id(v.entries(), created.id).cloned()))
            })
            .unwrap()
            .unwrap();
        assert_eq!(found, created);
        assert_eq!(found.password, "p@ss");
    }

    #[test]
    fn missing_vault_is_not_initialized() {
        let tmp = TempDir::new().unwrap();
        let audit = Recorder::default();
        let err = access(&tmp, &audit)
            .with_unlocked(pw("x"), AccessMode::Standard, |_| Ok(Outcome::unchanged(())))
            .unwrap_err();
        assert!(matches!(err, VaultError::NotInitialized(_)));
        assert!(audit.has(events::VAULT_ACCESS_FAIL, events::NOT_INITIALIZED));
        assert_eq!(audit.events().last().unwrap(), events::VAULT_LOCK);
    }

    #[test]
    fn require_initialized_checks_before_any_password() {
        let tmp = TempDir::new().unwrap();
        let audit = Recorder::default();
        let access = access(&tmp, &audit);

        let err = access.require_initialized().unwrap_err();
        assert!(matches!(err, VaultError::NotInitialized(_)));
        assert!(audit.has(events::VAULT_ACCESS_FAIL, events::NOT_INITIALIZED));

        access.initialize(pw("Secret123"), KdfLevel::Light).unwrap();
        assert!(access.require_initialized().is_ok());
    }

    #[test]
    fn wrong_password_fails_without_writing() {
        let tmp = TempDir::new().unwrap();
        let audit = Recorder::default();
        let access = access(&tmp, &audit);
        access.initialize(pw("Secret123"), KdfLevel::Light).unwrap();
        let before = fs::read(access.storage().vault_path()).unwrap();

        let mut ran = false;
        let err = access
            .with_unlocked(pw("wrong"), AccessMode::ReadReseal, |_| {
                ran = true;
                Ok(Outcome::unchanged(()))
            })
            .unwrap_err();

        assert!(matches!(err, VaultError::InvalidCredentials));
        assert!(!ran);
        assert_eq!(fs::read(access.storage().vault_path()).unwrap(), before);
        assert!(audit.has(events::VAULT_ACCESS_FAIL, events::INVALID_CREDENTIALS));
        assert_eq!(audit.events().last().unwrap(), events::VAULT_LOCK);
    }

    #[test]
    fn operation_errors_pass_through_and_skip_save() {
        let tmp = TempDir::new().unwrap();
        let audit = Recorder::default();
        let access = access(&tmp, &audit);
        access.initialize(pw("Secret123"), KdfLevel::Light).unwrap();
        let before = fs::read(access.storage().vault_path()).unwrap();

        let err = access
            .with_unlocked(pw("Secret123"), AccessMode::ReadReseal, |v| {
                repository::delete(v.entries(), uuid::Uuid::new_v4())
                    .map(|next| Outcome::replace(next, ()))
            })
            .unwrap_err();

        assert!(matches!(err, VaultError::NotFound(_)));
        assert_eq!(fs::read(access.storage().vault_path()).unwrap(), before);
        assert!(!audit.has(events::VAULT_ACCESS_FAIL, events::ACCESS_ERROR));
    }

    #[test]
    fn read_reseal_rotates_nonce_but_keeps_header() {
        let tmp = TempDir::new().unwrap();
        let audit = Recorder::default();
        let access = access(&tmp, &audit);
        access.initialize(pw("Secret123"), KdfLevel::Light).unwrap();
        add_github(&access);
        let before = access.storage().load().unwrap();

        access
            .with_unlocked(pw("Secret123"), AccessMode::ReadReseal, |_| {
                Ok(Outcome::unchanged(()))
            })
            .unwrap();

        let after = access.storage().load().unwrap();
        assert_ne!(after.nonce(), before.nonce());
        assert_ne!(after.ciphertext(), before.ciphertext());
        assert_eq!(after.header(), before.header());
    }

    #[test]
    fn standard_read_does_not_write() {
        let tmp = TempDir::new().unwrap();
        let audit = Recorder::default();
        let access = access(&tmp, &audit);
        access.initialize(pw("Secret123"), KdfLevel::Light).unwrap();
        let before = fs::read(access.storage().vault_path()).unwrap();

        access
            .with_unlocked(pw("Secret123"), AccessMode::Standard, |_| {
                Ok(Outcome::unchanged(()))
            })
            .unwrap();
        assert_eq!(fs::read(access.storage().vault_path()).unwrap(), before);
    }

    #[test]
    fn corrupted_ciphertext_is_generic_failure() {
        let tmp = TempDir::new().unwrap();
        let audit = Recorder::default();
        let access = access(&tmp, &audit);
        access.initialize(pw("Secret123"), KdfLevel::Light).unwrap();

        let blob = access.storage().load().unwrap();
        let mut cipher = blob.ciphertext().to_vec();
        cipher[0] ^= 0x01;
        let tampered = VaultBlob::new(blob.header().clone(), blob.nonce(), cipher).unwrap();
        access.storage().save(&tampered).unwrap();

        let err = access.authenticate(pw("Secret123")).unwrap_err();
        assert!(matches!(err, VaultError::AccessFailed));
        assert!(audit.has(events::VAULT_ACCESS_FAIL, events::ACCESS_ERROR));
    }

    #[test]
    fn purge_records_missing_lock() {
        struct NoLock;
        impl LockProof for NoLock {
            fn is_held(&self) -> bool {
                false
            }
        }

        let tmp = TempDir::new().unwrap();
        let audit = Recorder::default();
        let access = access(&tmp, &audit);
        access.initialize(pw("Secret123"), KdfLevel::Light).unwrap();

        let err = access.purge(&NoLock, true).unwrap_err();
        assert!(matches!(err, VaultError::LockRequired));
        assert!(audit.has(events::VAULT_PURGE_FAIL, events::PURGE_LOCK_REQUIRED));
        assert!(access.is_initialized().unwrap());
    }
}
