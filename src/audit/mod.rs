//! Audit trail: structured records of every vault transaction.
//!
//! The core only sees the `AuditSink` trait.  The SQLite-backed
//! `AuditLog` stores records in `<data_dir>/audit.db`; `NullAudit`
//! drops them.  Recording never fails the caller: a broken database
//! just means nothing is written.

#[cfg(feature = "audit-log")]
mod sqlite;

#[cfg(feature = "audit-log")]
pub use sqlite::AuditLog;

use std::fmt;

use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::platform::DataDir;

/// Event names and their numeric codes.
pub mod events {
    pub const VAULT_INIT: &str = "vault.init";
    pub const VAULT_INIT_FAIL: &str = "vault.init.fail";
    pub const VAULT_ACCESS: &str = "vault.access";
    pub const VAULT_ACCESS_FAIL: &str = "vault.access.fail";
    pub const VAULT_LOCK: &str = "vault.lock";
    pub const VAULT_PURGE_START: &str = "vault.purge.start";
    pub const VAULT_PURGE_FAIL: &str = "vault.purge.fail";
    pub const INPUT_INVALID: &str = "input.invalid";
    pub const ENTRY_ADD: &str = "entry.add";
    pub const ENTRY_ADD_FAIL: &str = "entry.add.fail";
    pub const ENTRY_GET: &str = "entry.get";
    pub const ENTRY_GET_FAIL: &str = "entry.get.fail";
    pub const ENTRY_UPDATE: &str = "entry.update";
    pub const ENTRY_UPDATE_FAIL: &str = "entry.update.fail";
    pub const ENTRY_DELETE: &str = "entry.delete";
    pub const ENTRY_DELETE_FAIL: &str = "entry.delete.fail";

    pub const OK: u16 = 0;
    pub const INIT_EXISTS: u16 = 101;
    pub const INIT_ERROR: u16 = 199;
    pub const NOT_INITIALIZED: u16 = 200;
    pub const INVALID_CREDENTIALS: u16 = 201;
    pub const ACCESS_ERROR: u16 = 299;
    pub const PURGE_LOCK_REQUIRED: u16 = 310;
    pub const PURGE_ERROR: u16 = 311;
    pub const INVALID_INPUT: u16 = 410;
    pub const ENTRY_NOT_FOUND: u16 = 404;
}

/// How an audited event ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    Success,
    Failure,
    Info,
}

impl AuditOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Destination for audit records.
///
/// `context` holds short key/value pairs such as an entry id or a failure
/// reason. Secrets must never be passed in.
pub trait AuditSink {
    fn record(&self, event: &str, outcome: AuditOutcome, code: u16, context: &[(&str, &str)]);
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAudit;

impl AuditSink for NullAudit {
    fn record(&self, _event: &str, _outcome: AuditOutcome, _code: u16, _context: &[(&str, &str)]) {}
}

/// A stored audit record.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event: String,
    pub outcome: String,
    pub code: u16,
    /// JSON object text.
    pub context: String,
}

/// The sink the CLI should use for this data directory.
///
/// Falls back to `NullAudit` when auditing is disabled in settings, the
/// database cannot be opened, or the `audit-log` feature is off.
pub fn open_sink(dir: &DataDir, settings: &Settings) -> Box<dyn AuditSink> {
    if !settings.audit {
        return Box::new(NullAudit);
    }

    #[cfg(feature = "audit-log")]
    {
        if dir.ensure().is_ok() {
            if let Some(log) = AuditLog::open(dir.root()) {
                return Box::new(log);
            }
        }
    }
    #[cfg(not(feature = "audit-log"))]
    let _ = dir;

    Box::new(NullAudit)
}
