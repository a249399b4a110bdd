//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.  Anything that came from the
//! vault is passed through `safe` before it reaches the terminal.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use comfy_table::{ContentArrangement, Table};
use console::style;
use regex::Regex;
use zeroize::Zeroizing;

use crate::vault::CredentialEntry;

/// Shown in place of a password that is not being revealed.
pub const HIDDEN: &str = "[hidden]";

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Strip ANSI escape sequences and control characters.
///
/// Stored fields are user-controlled; printing them raw would let an
/// entry rewrite the terminal.
pub fn safe(s: &str) -> String {
    static ANSI: OnceLock<Option<Regex>> = OnceLock::new();
    let ansi = ANSI.get_or_init(|| Regex::new(r"\x1B\[[0-9;?]*[ -/]*[@-~]").ok());

    let without_ansi = match ansi {
        Some(re) => re.replace_all(s, ""),
        None => s.into(),
    };
    without_ansi.chars().filter(|c| !c.is_control()).collect()
}

/// A password made safe to print, and whether anything had to be removed.
pub fn revealable(password: &str) -> (Zeroizing<String>, bool) {
    let shown = Zeroizing::new(safe(password));
    let altered = shown.as_str() != password;
    (shown, altered)
}

pub fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Print a table of entries (ID, Service, Username, Note, Updated).
///
/// Passwords are never part of it.
pub fn print_entries_table(entries: &[CredentialEntry]) {
    if entries.is_empty() {
        info("No entries in this vault yet.");
        tip("Run `credvault add --service <NAME> --username <USER>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["ID", "Service", "Username", "Note", "Updated"]);

    for e in entries {
        let note = if e.note.is_empty() { "" } else { "[saved]" };
        table.add_row(vec![
            e.id.to_string(),
            safe(&e.service),
            safe(&e.username),
            note.to_string(),
            timestamp(&e.updated_at),
        ]);
    }

    println!("{table}");
}

/// Print one entry as `Label: value` lines, password hidden.
pub fn print_entry(entry: &CredentialEntry) {
    println!("ID: {}", entry.id);
    println!("Service: {}", safe(&entry.service));
    println!("Username: {}", safe(&entry.username));
    println!("Created: {}", timestamp(&entry.created_at));
    println!("Updated: {}", timestamp(&entry.updated_at));
    if !entry.note.is_empty() {
        println!("Note: {}", safe(&entry.note));
    }
}
