//! Credential entries and the decrypted vault payload.
//!
//! Inside the ciphertext the vault holds `{"entries": [...]}`.  Entries
//! are parsed leniently (`RawEntry`, every field optional) and then
//! normalized by the repository, so one damaged entry cannot make the
//! whole vault unreadable.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::errors::{Result, VaultError};

/// A single stored credential.
///
/// The password and note are wiped when the entry is dropped, and never
/// appear in `Debug` output.
#[derive(Clone, PartialEq, Eq, Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct CredentialEntry {
    #[zeroize(skip)]
    pub id: Uuid,
    pub service: String,
    pub username: String,
    pub password: String,
    pub note: String,
    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,
    #[zeroize(skip)]
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("id", &self.id)
            .field("service", &self.service)
            .field("username", &self.username)
            .field("password", &"[hidden]")
            .field("note", &if self.note.is_empty() { "" } else { "[saved]" })
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Validated user input for a new entry. Never persisted directly.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CredentialInput {
    pub service: String,
    pub username: String,
    pub password: String,
    pub note: String,
}

impl CredentialInput {
    pub fn new(service: String, username: String, password: String, note: String) -> Self {
        Self {
            service,
            username,
            password,
            note,
        }
    }
}

impl fmt::Debug for CredentialInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialInput")
            .field("service", &self.service)
            .field("username", &self.username)
            .field("password", &"[hidden]")
            .finish_non_exhaustive()
    }
}

/// An entry as found in the decrypted payload, before normalization.
#[derive(Default, Zeroize, ZeroizeOnDrop)]
pub struct RawEntry {
    pub id: Option<String>,
    pub service: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub note: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// The decrypted payload as parsed, before normalization.
///
/// Entries that are not JSON objects, or that hold a non-string value
/// under a known key, become `None`.  Parsing goes straight from the
/// plaintext bytes into `RawEntry` values, so no untyped copy of a
/// password is ever built.
pub struct RawPayload {
    pub entries: Vec<Option<RawEntry>>,
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    entries: &'a [CredentialEntry],
}

impl RawPayload {
    /// Parse decrypted bytes.
    ///
    /// Fails `CorruptBlob` only when the document itself is not a JSON
    /// object; individual bad entries are kept as `None`.
    pub fn parse(plaintext: &[u8]) -> Result<Self> {
        serde_json::from_slice(plaintext)
            .map_err(|e| VaultError::CorruptBlob(format!("payload JSON: {e}")))
    }
}

impl<'de> Deserialize<'de> for RawPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(PayloadVisitor)
    }
}

struct PayloadVisitor;

impl<'de> Visitor<'de> for PayloadVisitor {
    type Value = RawPayload;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a payload object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<RawPayload, A::Error> {
        let mut entries = Vec::new();
        while let Some(key) = map.next_key::<String>()? {
            if key == "entries" {
                entries = map.next_value::<EntryList>()?.0;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(RawPayload { entries })
    }
}

struct EntryList(Vec<Option<RawEntry>>);

impl<'de> Deserialize<'de> for EntryList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct ListVisitor;

        impl<'de> Visitor<'de> for ListVisitor {
            type Value = EntryList;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a list of entries")
            }

            fn visit_seq<A: SeqAccess<'de>>(
                self,
                mut seq: A,
            ) -> std::result::Result<EntryList, A::Error> {
                let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element::<LenientEntry>()? {
                    out.push(item.0);
                }
                Ok(EntryList(out))
            }
        }

        deserializer.deserialize_seq(ListVisitor)
    }
}

/// One element of `entries`; anything but a well-typed object is `None`.
struct LenientEntry(Option<RawEntry>);

impl<'de> Deserialize<'de> for LenientEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(LenientEntryVisitor)
    }
}

struct LenientEntryVisitor;

impl<'de> Visitor<'de> for LenientEntryVisitor {
    type Value = LenientEntry;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an entry")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<LenientEntry, A::Error> {
        let mut entry = RawEntry::default();
        let mut malformed = false;
        while let Some(key) = map.next_key::<String>()? {
            let slot = match key.as_str() {
                "id" => &mut entry.id,
                "service" => &mut entry.service,
                "username" => &mut entry.username,
                "password" => &mut entry.password,
                "note" => &mut entry.note,
                "createdAt" => &mut entry.created_at,
                "updatedAt" => &mut entry.updated_at,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                    continue;
                }
            };
            slot.zeroize();
            match map.next_value::<Field>()? {
                Field::Text(value) => *slot = Some(value),
                Field::Null => *slot = None,
                Field::Other => malformed = true,
            }
        }
        Ok(LenientEntry(if malformed { None } else { Some(entry) }))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<LenientEntry, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(LenientEntry(None))
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<LenientEntry, E> {
        Ok(LenientEntry(None))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<LenientEntry, E> {
        Ok(LenientEntry(None))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<LenientEntry, E> {
        Ok(LenientEntry(None))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<LenientEntry, E> {
        Ok(LenientEntry(None))
    }

    fn visit_str<E: de::Error>(self, _: &str) -> std::result::Result<LenientEntry, E> {
        Ok(LenientEntry(None))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<LenientEntry, E> {
        Ok(LenientEntry(None))
    }
}

/// The value under a known entry key.
enum Field {
    Text(String),
    Null,
    Other,
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(FieldVisitor)
    }
}

struct FieldVisitor;

impl<'de> Visitor<'de> for FieldVisitor {
    type Value = Field;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string field")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<Field, E> {
        Ok(Field::Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<Field, E> {
        Ok(Field::Text(v))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Field, E> {
        Ok(Field::Null)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> std::result::Result<Field, E> {
        Ok(Field::Other)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> std::result::Result<Field, E> {
        Ok(Field::Other)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> std::result::Result<Field, E> {
        Ok(Field::Other)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> std::result::Result<Field, E> {
        Ok(Field::Other)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Field, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Field::Other)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Field, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Field::Other)
    }
}

/// Serialize an entry collection into payload bytes.
pub fn serialize_payload(entries: &[CredentialEntry]) -> Result<Zeroizing<Vec<u8>>> {
    serde_json::to_vec(&PayloadRef { entries })
        .map(Zeroizing::new)
        .map_err(|e| VaultError::SerializationError(format!("payload: {e}")))
}
