use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde_json::{Map, Value};

use crate::errors::{Result, VaultError};

use super::{AuditEntry, AuditOutcome, AuditSink};

/// SQLite-backed audit log at `<data_dir>/audit.db`.
pub struct AuditLog {
    conn: Connection,
}

impl AuditLog {
    /// Open (or create) the audit database.
    ///
    /// Returns `None` if it can't be opened; callers treat that as
    /// "auditing unavailable" and carry on.
    pub fn open(data_dir: &Path) -> Option<Self> {
        let db_path = Self::db_path(data_dir);
        let conn = Connection::open(&db_path).ok()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(crate::platform::paths::FILE_MODE);
            let _ = std::fs::set_permissions(&db_path, perms);
        }

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS audit_log (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event     TEXT NOT NULL,
                outcome   TEXT NOT NULL,
                code      INTEGER NOT NULL,
                context   TEXT NOT NULL
            );",
        )
        .ok()?;

        Some(Self { conn })
    }

    pub fn db_path(data_dir: &Path) -> PathBuf {
        data_dir.join("audit.db")
    }

    /// Most recent entries first.
    ///
    /// `since` keeps only entries at or after that instant.
    pub fn query(&self, limit: usize, since: Option<DateTime<Utc>>) -> Result<Vec<AuditEntry>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        // RFC 3339 UTC strings with the same precision sort chronologically.
        let since = since
            .map(|ts| ts.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
            .unwrap_or_default();

        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, timestamp, event, outcome, code, context
                 FROM audit_log
                 WHERE timestamp >= ?1
                 ORDER BY id DESC
                 LIMIT ?2",
            )
            .map_err(|e| VaultError::AuditError(format!("query prepare: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params![since, limit], |row| {
                let ts: String = row.get(1)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts)
                    .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));
                let code: i64 = row.get(4)?;

                Ok(AuditEntry {
                    id: row.get(0)?,
                    timestamp,
                    event: row.get(2)?,
                    outcome: row.get(3)?,
                    code: u16::try_from(code).unwrap_or(u16::MAX),
                    context: row.get(5)?,
                })
            })
            .map_err(|e| VaultError::AuditError(format!("query exec: {e}")))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| VaultError::AuditError(format!("row parse: {e}")))?);
        }
        Ok(entries)
    }
}

impl AuditSink for AuditLog {
    fn record(&self, event: &str, outcome: AuditOutcome, code: u16, context: &[(&str, &str)]) {
        let now = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        let context: Map<String, Value> = context
            .iter()
            .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
            .collect();
        let context = Value::Object(context).to_string();

        let _ = self.conn.execute(
            "INSERT INTO audit_log (timestamp, event, outcome, code, context)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![now, event, outcome.as_str(), i64::from(code), context],
        );
    }
}
