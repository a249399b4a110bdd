//! `credvault audit`: display the audit log.
//!
//! Usage:
//!   credvault audit               # show last 50 entries
//!   credvault audit --last 20     # show last 20
//!   credvault audit --since 7d    # entries from last 7 days

use chrono::{DateTime, Utc};

use crate::cli::output;
use crate::cli::Cli;
use crate::errors::{Result, VaultError};

/// Execute the `audit` command.
#[cfg(feature = "audit-log")]
pub fn execute(cli: &Cli, last: usize, since: Option<&str>) -> Result<()> {
    use crate::audit::AuditLog;
    use crate::platform::DataDir;

    let dir = DataDir::resolve(&cli.data_dir)?;
    if !dir.audit_path().exists() {
        output::info("No audit entries found.");
        return Ok(());
    }

    let audit = AuditLog::open(dir.root())
        .ok_or_else(|| VaultError::AuditError("failed to open audit database".into()))?;

    let since_dt = since.map(parse_duration).transpose()?;
    let entries = audit.query(last, since_dt)?;

    if entries.is_empty() {
        output::info("No audit entries found.");
        return Ok(());
    }

    print_audit_table(&entries);
    Ok(())
}

/// Execute the `audit` command.
#[cfg(not(feature = "audit-log"))]
pub fn execute(_cli: &Cli, _last: usize, _since: Option<&str>) -> Result<()> {
    Err(VaultError::AuditError(
        "this build has no audit log (feature `audit-log` is disabled)".into(),
    ))
}

/// Parse a human-friendly duration string like "7d", "24h", "30m".
#[cfg_attr(not(feature = "audit-log"), allow(dead_code))]
fn parse_duration(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    let (num_str, duration): (&str, fn(i64) -> chrono::Duration) =
        if let Some(s) = input.strip_suffix('d') {
            (s, chrono::Duration::days)
        } else if let Some(s) = input.strip_suffix('h') {
            (s, chrono::Duration::hours)
        } else if let Some(s) = input.strip_suffix('m') {
            (s, chrono::Duration::minutes)
        } else {
            return Err(VaultError::CommandFailed(format!(
                "invalid duration '{input}': use format like 7d, 24h, or 30m"
            )));
        };

    let num: i64 = num_str.parse().map_err(|_| {
        VaultError::CommandFailed(format!(
            "invalid duration '{input}': number part is not valid"
        ))
    })?;
    if !(0..=36_500).contains(&num) {
        return Err(VaultError::CommandFailed(format!(
            "invalid duration '{input}': out of range"
        )));
    }

    Ok(Utc::now() - duration(num))
}

/// Print audit entries in a formatted table.
#[cfg(feature = "audit-log")]
fn print_audit_table(entries: &[crate::audit::AuditEntry]) {
    use comfy_table::{ContentArrangement, Table};
    use console::style;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Time", "Event", "Outcome", "Code", "Context"]);

    for entry in entries {
        table.add_row(vec![
            output::timestamp(&entry.timestamp),
            colorize_event(&entry.event),
            entry.outcome.clone(),
            entry.code.to_string(),
            output::safe(&entry.context),
        ]);
    }

    println!(
        "{}",
        style(format!("{} audit entries:", entries.len())).bold()
    );
    println!("{table}");
}

/// Colorize event names for display.
#[cfg_attr(not(feature = "audit-log"), allow(dead_code))]
fn colorize_event(event: &str) -> String {
    use console::style;

    if event.ends_with(".fail") || event == "input.invalid" {
        style(event).red().to_string()
    } else if event.starts_with("vault.purge") {
        style(event).yellow().to_string()
    } else if event.starts_with("entry.") {
        style(event).blue().to_string()
    } else if event == "vault.init" {
        style(event).green().to_string()
    } else {
        event.to_string()
    }
}
