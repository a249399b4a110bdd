//! CLI module: clap argument parser, prompts, output helpers and commands.

pub mod clipboard;
pub mod commands;
pub mod output;
pub mod pick;

use std::io::{self, IsTerminal, Read};

use clap::Parser;
use zeroize::Zeroizing;

use crate::audit::{events, open_sink, AuditOutcome, AuditSink};
use crate::config::Settings;
use crate::errors::{Result, VaultError};
use crate::platform::DataDir;
use crate::validation::{ValidationError, MAX_PASSWORD_LEN};
use crate::vault::{VaultAccess, VaultStorage};

/// Environment variable holding the master password for scripted use.
pub const PASSWORD_ENV: &str = "CREDVAULT_PASSWORD";

/// CredVault CLI: encrypted local credential vault.
#[derive(Parser)]
#[command(
    name = "credvault",
    about = "Encrypted local credential vault",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding the vault (default: .credvault)
    #[arg(
        long,
        env = "CREDVAULT_DATA_DIR",
        default_value = ".credvault",
        global = true
    )]
    pub data_dir: String,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new vault (asks before replacing an existing one)
    Init {
        /// Replace an existing vault without asking
        #[arg(short, long)]
        force: bool,
    },

    /// Add a credential (password is prompted or read from stdin)
    Add {
        /// Service name, e.g. github.com
        #[arg(short, long)]
        service: Option<String>,
        /// Login name for the service
        #[arg(short, long)]
        username: Option<String>,
        /// Free-text note (max 250 characters)
        #[arg(short, long)]
        note: Option<String>,
    },

    /// List credentials (passwords are never shown)
    List {
        /// Only entries whose service matches exactly
        #[arg(short, long)]
        service: Option<String>,
    },

    /// Show one credential (pick it from a list when no id or service is given)
    Get {
        /// Entry id
        #[arg(long, conflicts_with = "service")]
        id: Option<String>,
        /// First entry for this service
        #[arg(short, long)]
        service: Option<String>,
        /// Copy the password to the clipboard
        #[arg(short, long)]
        copy: bool,
        /// Print the password to stdout
        #[arg(long)]
        show: bool,
    },

    /// Change fields of a credential (pick it from a list when no id is given)
    Update {
        /// Entry id
        #[arg(long)]
        id: Option<String>,
        /// New service name
        #[arg(short, long)]
        service: Option<String>,
        /// New username
        #[arg(short, long)]
        username: Option<String>,
        /// New note
        #[arg(short, long)]
        note: Option<String>,
        /// Prompt for a new password
        #[arg(short, long)]
        password: bool,
    },

    /// Delete a credential
    Delete {
        /// Entry id
        #[arg(long)]
        id: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Check the master password and report the vault contents
    Unlock,

    /// Permanently delete the vault
    Purge {
        /// Keep the audit log
        #[arg(long)]
        keep_audit: bool,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// View the audit log
    Audit {
        /// Number of entries to show (default: 50)
        #[arg(long, default_value = "50")]
        last: usize,
        /// Show entries since a duration ago (e.g. 7d, 24h, 30m)
        #[arg(long)]
        since: Option<String>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell)
        shell: String,
    },
}

// ---------------------------------------------------------------------------
// Per-invocation context
// ---------------------------------------------------------------------------

/// Data directory, settings and audit sink for one command.
pub struct Context {
    pub dir: DataDir,
    pub settings: Settings,
    pub audit: Box<dyn AuditSink>,
}

impl Context {
    pub fn load(cli: &Cli) -> Result<Self> {
        let dir = DataDir::resolve(&cli.data_dir)?;
        let settings = Settings::load(dir.root())?;
        let audit = open_sink(&dir, &settings);
        Ok(Self {
            dir,
            settings,
            audit,
        })
    }

    pub fn access(&self) -> VaultAccess<'_> {
        VaultAccess::new(VaultStorage::new(self.dir.clone()), self.audit.as_ref())
    }

    /// The accessor and the master password, asked for only once the vault
    /// is known to exist.
    pub fn unlock_prompt(&self) -> Result<(VaultAccess<'_>, Zeroizing<String>)> {
        let access = self.access();
        access.require_initialized()?;
        let master = prompt_password("Master password")?;
        Ok((access, master))
    }

    /// Pass a validated value through, auditing rejected input.
    pub fn checked<T>(&self, result: std::result::Result<T, ValidationError>) -> Result<T> {
        result.map_err(|e| {
            self.audit.record(
                events::INPUT_INVALID,
                AuditOutcome::Failure,
                events::INVALID_INPUT,
                &[("code", e.code)],
            );
            VaultError::from(e)
        })
    }

    /// Record the result of an entry operation.
    ///
    /// Transaction failures are already audited by `VaultAccess`, so only
    /// the operation's own errors are recorded here.
    pub fn record_entry<T>(&self, event: &str, fail_event: &str, id: &str, result: &Result<T>) {
        match result {
            Ok(_) => self
                .audit
                .record(event, AuditOutcome::Success, events::OK, &[("id", id)]),
            Err(e @ VaultError::NotFound(_)) => self.audit.record(
                fail_event,
                AuditOutcome::Failure,
                events::ENTRY_NOT_FOUND,
                &[("reason", e.reason())],
            ),
            Err(e @ (VaultError::NothingToUpdate | VaultError::Validation(_))) => {
                self.audit.record(
                    fail_event,
                    AuditOutcome::Failure,
                    events::INVALID_INPUT,
                    &[("reason", e.reason())],
                )
            }
            Err(_) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

/// Get the master password: `CREDVAULT_PASSWORD` first, then a hidden prompt.
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password(prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

/// Choose a new master password, with confirmation and a minimum length.
///
/// Also respects `CREDVAULT_PASSWORD` for scripted use.
pub fn prompt_new_password(min_len: usize) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            let pw = Zeroizing::new(pw);
            if pw.chars().count() < min_len {
                return Err(VaultError::CommandFailed(format!(
                    "master password must be at least {min_len} characters"
                )));
            }
            return Ok(pw);
        }
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Set master password")
                .with_confirmation("Repeat master password", "Passwords do not match, try again")
                .interact()
                .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?,
        );

        if password.chars().count() < min_len {
            output::warning(&format!(
                "Master password must be at least {min_len} characters. Try again."
            ));
            continue;
        }

        return Ok(password);
    }
}

/// Read an entry password: from stdin when piped, else a hidden prompt.
///
/// Never taken from a command-line flag, so it stays out of shell history.
/// Piped input is returned as raw bytes, minus the trailing line break, so
/// the caller can validate the encoding.
pub fn read_entry_password() -> Result<Zeroizing<Vec<u8>>> {
    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(Vec::with_capacity(MAX_PASSWORD_LEN + 2));
        io::stdin().read_to_end(&mut buf)?;
        trim_line_end(&mut buf);
        return Ok(buf);
    }

    prompt_entry_password()
}

/// Hidden prompt with confirmation for an entry password.
pub fn prompt_entry_password() -> Result<Zeroizing<Vec<u8>>> {
    let pw = dialoguer::Password::new()
        .with_prompt("Entry password")
        .with_confirmation("Repeat entry password", "Passwords do not match, try again")
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw.into_bytes()))
}

fn trim_line_end(buf: &mut Vec<u8>) {
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
}

/// Ask for a plain-text value when it was not given as a flag.
pub fn prompt_text(prompt: &str, value: Option<String>, allow_empty: bool) -> Result<String> {
    if let Some(v) = value {
        return Ok(v);
    }
    dialoguer::Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(allow_empty)
        .interact_text()
        .map_err(|e| VaultError::CommandFailed(format!("input prompt: {e}")))
}

/// Yes/no confirmation, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| VaultError::CommandFailed(format!("confirm prompt: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn get_takes_id_or_service_or_neither() {
        assert!(Cli::try_parse_from(["credvault", "get"]).is_ok());
        assert!(Cli::try_parse_from(["credvault", "get", "--service", "github.com"]).is_ok());
        assert!(Cli::try_parse_from([
            "credvault",
            "get",
            "--id",
            "x",
            "--service",
            "github.com"
        ])
        .is_err());
    }

    #[test]
    fn data_dir_flag_is_global() {
        let cli = Cli::try_parse_from(["credvault", "--data-dir", "/tmp/v", "unlock"]).unwrap();
        assert_eq!(cli.data_dir, "/tmp/v");
    }

    #[test]
    fn update_id_is_optional() {
        let cli = Cli::try_parse_from(["credvault", "update", "--note", "x"]).unwrap();
        assert!(matches!(cli.command, Commands::Update { id: None, .. }));
    }

    #[test]
    fn trim_line_end_keeps_inner_bytes() {
        let mut buf = b"p@ss\r\n\n".to_vec();
        trim_line_end(&mut buf);
        assert_eq!(buf, b"p@ss");

        let mut raw = vec![0xff, 0xfe, b'\n'];
        trim_line_end(&mut raw);
        assert_eq!(raw, [0xffu8, 0xfe]);
    }

    #[test]
    fn prompt_text_prefers_flag_value() {
        let v = prompt_text("Service", Some("github.com".into()), false).unwrap();
        assert_eq!(v, "github.com");
    }
}
