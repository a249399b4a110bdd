//! Pure CRUD over the decrypted entry collection.
//!
//! Nothing here touches the disk or the crypto layer.  Every mutating
//! function leaves its input alone and returns a new collection; the
//! transaction in `access` decides whether that collection is persisted.

use chrono::{DateTime, TimeDelta, Utc};
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::errors::{Result, VaultError};
use crate::validation::MAX_NOTE_LEN;

use super::entry::{CredentialEntry, CredentialInput, RawEntry, RawPayload};

/// Optional replacement values for `update`.
///
/// `None` leaves the field untouched.
#[derive(Clone, Default)]
pub struct EntryChanges {
    pub service: Option<String>,
    pub username: Option<String>,
    pub password: Option<Zeroizing<String>>,
    pub note: Option<String>,
}

impl EntryChanges {
    pub fn is_empty(&self) -> bool {
        self.service.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.note.is_none()
    }
}

/// Turn a parsed payload into a clean collection.
///
/// Entries with a missing or non-v4 id, an empty required field, or
/// unparseable timestamps are dropped.  Duplicate ids keep the first.
/// Notes longer than 250 characters are cut to 250.
pub fn normalize(raw: RawPayload) -> Vec<CredentialEntry> {
    let mut out: Vec<CredentialEntry> = Vec::with_capacity(raw.entries.len());
    for mut candidate in raw.entries.into_iter().flatten() {
        if let Some(entry) = normalize_entry(&mut candidate) {
            if out.iter().all(|e| e.id != entry.id) {
                out.push(entry);
            }
        }
    }
    out
}

fn normalize_entry(raw: &mut RawEntry) -> Option<CredentialEntry> {
    let id = Uuid::parse_str(raw.id.as_deref()?).ok()?;
    if id.get_version_num() != 4 {
        return None;
    }
    let created_at = parse_entry_time(raw.created_at.as_deref()?)?;
    let updated_at = parse_entry_time(raw.updated_at.as_deref()?)?;
    if updated_at < created_at {
        return None;
    }

    let service = raw.service.take().filter(|s| !s.is_empty())?;
    let username = raw.username.take().filter(|s| !s.is_empty())?;
    let password = raw.password.take().filter(|s| !s.is_empty())?;
    let mut note = raw.note.take().unwrap_or_default();
    if let Some((cut, _)) = note.char_indices().nth(MAX_NOTE_LEN) {
        note.truncate(cut);
    }

    Some(CredentialEntry {
        id,
        service,
        username,
        password,
        note,
        created_at,
        updated_at,
    })
}

fn parse_entry_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Entries in stored order, optionally only those whose service matches
/// exactly (case-sensitive).
pub fn list<'a>(entries: &'a [CredentialEntry], service: Option<&str>) -> Vec<&'a CredentialEntry> {
    match service {
        Some(filter) if !filter.is_empty() => {
            entries.iter().filter(|e| e.service == filter).collect()
        }
        _ => entries.iter().collect(),
    }
}

/// Find an entry by id.
pub fn get_by_id(entries: &[CredentialEntry], id: Uuid) -> Option<&CredentialEntry> {
    entries.iter().find(|e| e.id == id)
}

/// Append a new entry built from validated input.
///
/// Returns the new collection and a copy of the created entry.
pub fn add(
    entries: &[CredentialEntry],
    input: &CredentialInput,
) -> (Vec<CredentialEntry>, CredentialEntry) {
    let mut id = Uuid::new_v4();
    while get_by_id(entries, id).is_some() {
        id = Uuid::new_v4();
    }

    let now = Utc::now();
    let created = CredentialEntry {
        id,
        service: input.service.clone(),
        username: input.username.clone(),
        password: input.password.clone(),
        note: input.note.clone(),
        created_at: now,
        updated_at: now,
    };

    let mut next = entries.to_vec();
    next.push(created.clone());
    (next, created)
}

/// Replace the supplied fields of one entry.
///
/// Fails `NothingToUpdate` when `changes` is empty and `NotFound` when
/// the id is unknown; in both cases no new collection is produced.
/// `updated_at` always moves forward; `created_at` never changes.
pub fn update(
    entries: &[CredentialEntry],
    id: Uuid,
    changes: &EntryChanges,
) -> Result<(Vec<CredentialEntry>, CredentialEntry)> {
    if changes.is_empty() {
        return Err(VaultError::NothingToUpdate);
    }
    let index = entries
        .iter()
        .position(|e| e.id == id)
        .ok_or_else(|| VaultError::NotFound(id.to_string()))?;

    let mut updated = entries[index].clone();
    if let Some(service) = &changes.service {
        updated.service = service.clone();
    }
    if let Some(username) = &changes.username {
        updated.username = username.clone();
    }
    if let Some(password) = &changes.password {
        updated.password = password.to_string();
    }
    if let Some(note) = &changes.note {
        updated.note = note.clone();
    }
    updated.updated_at = next_timestamp(updated.updated_at);

    let mut next = entries.to_vec();
    next[index] = updated.clone();
    Ok((next, updated))
}

/// Remove one entry, keeping the order of the rest.
pub fn delete(entries: &[CredentialEntry], id: Uuid) -> Result<Vec<CredentialEntry>> {
    if get_by_id(entries, id).is_none() {
        return Err(VaultError::NotFound(id.to_string()));
    }
    Ok(entries.iter().filter(|e| e.id != id).cloned().collect())
}

/// Now, or one microsecond after `previous` if the clock has not moved.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + TimeDelta::microseconds(1)
    }
}
