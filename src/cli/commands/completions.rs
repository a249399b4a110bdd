//! `credvault completions <shell>` writes a completion script to stdout,
//! e.g. `credvault completions zsh > ~/.zfunc/_credvault`.

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::{Result, VaultError};

const SUPPORTED: &str = "bash, zsh, fish, powershell, elvish";

pub fn execute(shell: &str) -> Result<()> {
    let shell = parse_shell(shell)?;
    generate(shell, &mut Cli::command(), "credvault", &mut io::stdout());
    Ok(())
}

/// Shell names are matched case-insensitively; `ps` is short for PowerShell.
fn parse_shell(name: &str) -> Result<Shell> {
    let shell = match name.to_ascii_lowercase().as_str() {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        "powershell" | "ps" => Shell::PowerShell,
        "elvish" => Shell::Elvish,
        other => {
            return Err(VaultError::CommandFailed(format!(
                "unknown shell '{other}' (supported: {SUPPORTED})"
            )))
        }
    };
    Ok(shell)
}
