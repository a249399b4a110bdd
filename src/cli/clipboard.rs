//! Copying a password to the system clipboard.

use arboard::Clipboard;
use thiserror::Error;

/// Why the clipboard could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    /// No clipboard provider (no display server, headless session).
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
    /// The clipboard exists but refused the text.
    #[error("unable to copy to clipboard: {0}")]
    CopyFailed(String),
}

/// Place `secret` on the clipboard.
///
/// The caller reports failure; it never aborts the command.
pub fn copy(secret: &str) -> Result<(), ClipboardError> {
    let mut clipboard =
        Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
    clipboard
        .set_text(secret)
        .map_err(|e| ClipboardError::CopyFailed(e.to_string()))
}
