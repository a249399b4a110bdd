//! Vault file format: header, KDF parameters and the encrypted blob.
//!
//! A vault file is a single JSON object:
//!
//! ```text
//! { "header": { "version": 1,
//!               "kdf": { "name": "argon2id", "opslimit": "MEDIUM",
//!                        "memlimit": "MEDIUM", "salt": "<base64>" },
//!               "masterHash": "<PHC string>",
//!               "createdAt": "<RFC 3339 UTC>", "updatedAt": "<RFC 3339 UTC>",
//!               "vaultId": "<uuid v4>" },
//!   "nonce": "<base64>",
//!   "cipher": "<base64>" }
//! ```
//!
//! The typed values below validate themselves on construction and never
//! change afterwards.  The `*Repr` structs are the serde mirror of the
//! JSON; `from_representation` is the only way from one to the other.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::crypto::kdf::{KdfLevel, KDF_ALGORITHM, SALT_LEN};
use crate::crypto::{is_recognized_hash, NONCE_LEN};
use crate::errors::{Result, VaultError};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// The one supported header schema version.
pub const CURRENT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// KdfParams
// ---------------------------------------------------------------------------

/// Key-derivation parameters stored in the header so the exact same
/// KDF settings are used when re-opening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KdfParams {
    ops_level: KdfLevel,
    mem_level: KdfLevel,
    salt: [u8; SALT_LEN],
}

/// JSON shape of `KdfParams`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfRepr {
    pub name: String,
    pub opslimit: String,
    pub memlimit: String,
    pub salt: String,
}

impl KdfParams {
    /// Build argon2id parameters. Fails `InvalidSalt` on a wrong salt length.
    pub fn new(ops_level: KdfLevel, mem_level: KdfLevel, salt: &[u8]) -> Result<Self> {
        let salt: [u8; SALT_LEN] = salt.try_into().map_err(|_| VaultError::InvalidSalt {
            expected: SALT_LEN,
            actual: salt.len(),
        })?;
        Ok(Self {
            ops_level,
            mem_level,
            salt,
        })
    }

    /// Fresh parameters with a random salt at a single cost level.
    pub fn generate(level: KdfLevel) -> Self {
        Self {
            ops_level: level,
            mem_level: level,
            salt: crate::crypto::generate_salt(),
        }
    }

    pub fn algorithm(&self) -> &'static str {
        KDF_ALGORITHM
    }

    pub fn ops_level(&self) -> KdfLevel {
        self.ops_level
    }

    pub fn mem_level(&self) -> KdfLevel {
        self.mem_level
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn to_representation(&self) -> KdfRepr {
        KdfRepr {
            name: KDF_ALGORITHM.to_string(),
            opslimit: self.ops_level.as_str().to_string(),
            memlimit: self.mem_level.as_str().to_string(),
            salt: BASE64.encode(self.salt),
        }
    }

    pub fn from_representation(repr: &KdfRepr) -> Result<Self> {
        if repr.name != KDF_ALGORITHM {
            return Err(VaultError::CorruptHeader(format!(
                "KDF name must be {KDF_ALGORITHM}, got '{}'",
                repr.name
            )));
        }
        let ops: KdfLevel = repr.opslimit.parse()?;
        let mem: KdfLevel = repr.memlimit.parse()?;
        let salt = BASE64
            .decode(&repr.salt)
            .map_err(|e| VaultError::CorruptHeader(format!("KDF salt is not base64: {e}")))?;
        Self::new(ops, mem, &salt).map_err(|e| VaultError::CorruptHeader(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// VaultHeader
// ---------------------------------------------------------------------------

/// Metadata stored in the clear at the top of a vault file.
///
/// Its digest is the associated data for the ciphertext, so the header
/// cannot be swapped or edited without breaking decryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultHeader {
    version: u32,
    kdf: KdfParams,
    master_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    vault_id: Uuid,
}

/// JSON shape of `VaultHeader`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderRepr {
    pub version: u32,
    pub kdf: KdfRepr,
    pub master_hash: String,
    pub created_at: String,
    pub updated_at: String,
    pub vault_id: String,
}

impl VaultHeader {
    /// Validate and build a header.
    ///
    /// Timestamps are truncated to whole seconds, which is the precision
    /// they are stored with.
    pub fn new(
        version: u32,
        kdf: KdfParams,
        master_hash: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        vault_id: Uuid,
    ) -> Result<Self> {
        if version != CURRENT_VERSION {
            return Err(VaultError::CorruptHeader(format!(
                "unsupported version {version}, expected {CURRENT_VERSION}"
            )));
        }
        if !is_recognized_hash(&master_hash) {
            return Err(VaultError::CorruptHeader(
                "master hash is not a recognized hash format".into(),
            ));
        }
        if vault_id.get_version_num() != 4 {
            return Err(VaultError::CorruptHeader(
                "vault id must be a random (v4) UUID".into(),
            ));
        }
        let created_at = created_at.trunc_subsecs(0);
        let updated_at = updated_at.trunc_subsecs(0);
        if updated_at < created_at {
            return Err(VaultError::CorruptHeader(
                "updatedAt precedes createdAt".into(),
            ));
        }
        Ok(Self {
            version,
            kdf,
            master_hash,
            created_at,
            updated_at,
            vault_id,
        })
    }

    /// A brand-new header: fresh vault id, both timestamps set to now.
    pub fn create(kdf: KdfParams, master_hash: String) -> Result<Self> {
        let now = Utc::now();
        Self::new(CURRENT_VERSION, kdf, master_hash, now, now, Uuid::new_v4())
    }

    /// Copy of this header with `updatedAt` set to now.
    ///
    /// Identity, KDF parameters and the master hash are carried over.
    pub fn with_updated_now(&self) -> Self {
        let now = Utc::now().trunc_subsecs(0);
        Self {
            updated_at: now.max(self.created_at),
            ..self.clone()
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn kdf(&self) -> &KdfParams {
        &self.kdf
    }

    pub fn master_hash(&self) -> &str {
        &self.master_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn vault_id(&self) -> Uuid {
        self.vault_id
    }

    pub fn to_representation(&self) -> HeaderRepr {
        HeaderRepr {
            version: self.version,
            kdf: self.kdf.to_representation(),
            master_hash: self.master_hash.clone(),
            created_at: format_timestamp(self.created_at),
            updated_at: format_timestamp(self.updated_at),
            vault_id: self.vault_id.to_string(),
        }
    }

    pub fn from_representation(repr: &HeaderRepr) -> Result<Self> {
        let kdf = KdfParams::from_representation(&repr.kdf)?;
        let created_at = parse_timestamp(&repr.created_at)?;
        let updated_at = parse_timestamp(&repr.updated_at)?;
        let vault_id = Uuid::parse_str(&repr.vault_id)
            .map_err(|e| VaultError::CorruptHeader(format!("vault id: {e}")))?;
        Self::new(
            repr.version,
            kdf,
            repr.master_hash.clone(),
            created_at,
            updated_at,
            vault_id,
        )
    }

    /// SHA-256 over the canonical JSON of this header.
    ///
    /// Used as AEAD associated data.
    pub fn digest(&self) -> Result<[u8; 32]> {
        let canonical = serde_json::to_vec(&self.to_representation())
            .map_err(|e| VaultError::SerializationError(format!("header: {e}")))?;
        Ok(Sha256::digest(&canonical).into())
    }
}

// ---------------------------------------------------------------------------
// VaultBlob
// ---------------------------------------------------------------------------

/// The unit of at-rest persistence: header, nonce and ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultBlob {
    header: VaultHeader,
    nonce: [u8; NONCE_LEN],
    ciphertext: Vec<u8>,
}

/// JSON shape of `VaultBlob`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobRepr {
    pub header: HeaderRepr,
    pub nonce: String,
    pub cipher: String,
}

impl VaultBlob {
    /// Validate and build a blob.
    pub fn new(header: VaultHeader, nonce: &[u8], ciphertext: Vec<u8>) -> Result<Self> {
        let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|_| {
            VaultError::CorruptBlob(format!(
                "nonce must be {NONCE_LEN} bytes, got {}",
                nonce.len()
            ))
        })?;
        if ciphertext.is_empty() {
            return Err(VaultError::CorruptBlob("ciphertext is empty".into()));
        }
        Ok(Self {
            header,
            nonce,
            ciphertext,
        })
    }

    pub fn header(&self) -> &VaultHeader {
        &self.header
    }

    pub fn nonce(&self) -> &[u8] {
        &self.nonce
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn to_representation(&self) -> BlobRepr {
        BlobRepr {
            header: self.header.to_representation(),
            nonce: BASE64.encode(self.nonce),
            cipher: BASE64.encode(&self.ciphertext),
        }
    }

    pub fn from_representation(repr: &BlobRepr) -> Result<Self> {
        let header = VaultHeader::from_representation(&repr.header)?;
        let nonce = BASE64
            .decode(&repr.nonce)
            .map_err(|e| VaultError::CorruptBlob(format!("nonce is not base64: {e}")))?;
        let ciphertext = BASE64
            .decode(&repr.cipher)
            .map_err(|e| VaultError::CorruptBlob(format!("cipher is not base64: {e}")))?;
        Self::new(header, &nonce, ciphertext)
    }

    /// Serialize to the on-disk JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.to_representation())
            .map_err(|e| VaultError::SerializationError(format!("vault blob: {e}")))
    }

    /// Parse on-disk JSON bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let repr: BlobRepr = serde_json::from_slice(data)
            .map_err(|e| VaultError::CorruptBlob(format!("vault JSON: {e}")))?;
        Self::from_representation(&repr)
    }
}

// ---------------------------------------------------------------------------
// Timestamp helpers
// ---------------------------------------------------------------------------

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if s.is_empty() {
        return Err(VaultError::CorruptHeader("missing timestamp".into()));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| VaultError::CorruptHeader(format!("invalid timestamp '{s}': {e}")))
}
