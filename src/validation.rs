//! Field-syntax validation for credential input.
//!
//! Each validator takes the raw user input and returns the cleaned value
//! or a `ValidationError` carrying a short code. The user-facing message
//! is deliberately coarse ("Invalid service"); the code says why.

use thiserror::Error;
use uuid::Uuid;

/// Maximum length of a service name in bytes (ASCII only).
pub const MAX_SERVICE_LEN: usize = 255;

/// Maximum length of a username in characters.
pub const MAX_USERNAME_LEN: usize = 255;

/// Maximum length of a stored password in bytes.
pub const MAX_PASSWORD_LEN: usize = 4096;

/// Maximum length of a note in characters.
pub const MAX_NOTE_LEN: usize = 250;

/// A rejected field value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Short code such as `SVC_FORMAT`, safe to write to the audit log.
    pub code: &'static str,
    pub message: &'static str,
}

impl ValidationError {
    fn new(code: &'static str, message: &'static str) -> Self {
        Self { code, message }
    }
}

/// Service: trimmed, 1..=255 bytes of `[A-Za-z0-9._:-]`.
pub fn validate_service(raw: &str) -> Result<String, ValidationError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(ValidationError::new("SVC_EMPTY", "Invalid service"));
    }
    if s.len() > MAX_SERVICE_LEN {
        return Err(ValidationError::new("SVC_LEN", "Invalid service"));
    }
    if !s
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b':' | b'-'))
    {
        return Err(ValidationError::new("SVC_FORMAT", "Invalid service"));
    }
    Ok(s.to_string())
}

/// Username: control characters removed, trimmed, 1..=255 characters.
pub fn validate_username(raw: &str) -> Result<String, ValidationError> {
    let stripped = strip_controls(raw);
    let u = stripped.trim();
    let len = u.chars().count();
    if len < 1 {
        return Err(ValidationError::new("USR_EMPTY", "Invalid username"));
    }
    if len > MAX_USERNAME_LEN {
        return Err(ValidationError::new("USR_LEN", "Invalid username"));
    }
    Ok(u.to_string())
}

/// Password: 1..=4096 bytes, taken verbatim (no trimming).
///
/// UTF-8 validity is guaranteed by the `&str` type; byte input should go
/// through [`validate_password_bytes`].
pub fn validate_password(raw: &str) -> Result<String, ValidationError> {
    if raw.is_empty() || raw.len() > MAX_PASSWORD_LEN {
        return Err(ValidationError::new("PWD_LEN", "Invalid password"));
    }
    Ok(raw.to_string())
}

/// Password supplied as raw bytes (e.g. piped stdin).
pub fn validate_password_bytes(raw: &[u8]) -> Result<String, ValidationError> {
    let s = std::str::from_utf8(raw)
        .map_err(|_| ValidationError::new("PWD_UTF8", "Invalid password"))?;
    validate_password(s)
}

/// Note: control characters removed, trimmed, cut to 250 characters.
///
/// An empty note is valid.
pub fn validate_note(raw: &str) -> Result<String, ValidationError> {
    let stripped = strip_controls(raw);
    let n = stripped.trim();
    if n.chars().count() > MAX_NOTE_LEN {
        return Ok(n.chars().take(MAX_NOTE_LEN).collect());
    }
    Ok(n.to_string())
}

/// Entry ids must be random (version 4) UUIDs.
pub fn validate_entry_id(raw: &str) -> Result<Uuid, ValidationError> {
    match Uuid::parse_str(raw.trim()) {
        Ok(id) if id.get_version_num() == 4 => Ok(id),
        _ => Err(ValidationError::new("ID_FORMAT", "Invalid id")),
    }
}

/// Drop C0 controls and DEL; keep everything else.
fn strip_controls(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(*c, '\u{0}'..='\u{1f}' | '\u{7f}'))
        .collect()
}
