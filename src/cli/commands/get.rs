//! `credvault get`: show one entry, optionally revealing its password.
//!
//! Runs in read-reseal mode: the vault is re-encrypted under a fresh
//! nonce every time a secret is read.  Without `--id` or `--service` the
//! entry is picked from a list of services.

use crate::audit::events;
use crate::cli::{clipboard, output, pick};
use crate::cli::{Cli, Context};
use crate::errors::{Result, VaultError};
use crate::validation::{validate_entry_id, validate_service};
use crate::vault::{repository, AccessMode, CredentialEntry, Outcome};

/// How to find the entry.
enum Lookup {
    Id(uuid::Uuid),
    Service(String),
    Pick,
}

/// Execute the `get` command.
pub fn execute(
    cli: &Cli,
    id: Option<&str>,
    service: Option<&str>,
    copy: bool,
    show: bool,
) -> Result<()> {
    let ctx = Context::load(cli)?;

    let lookup = match (id, service) {
        (Some(raw), _) => Lookup::Id(ctx.checked(validate_entry_id(raw))?),
        (None, Some(raw)) => Lookup::Service(ctx.checked(validate_service(raw))?),
        (None, None) => Lookup::Pick,
    };

    let (access, master) = ctx.unlock_prompt()?;
    let result = access.with_unlocked(master, AccessMode::ReadReseal, |vault| {
        let entries = vault.entries();
        let found = match &lookup {
            Lookup::Id(id) => repository::get_by_id(entries, *id).cloned(),
            Lookup::Service(s) => repository::list(entries, Some(s.as_str()))
                .into_iter()
                .next()
                .cloned(),
            Lookup::Pick if entries.is_empty() => {
                output::info("No entries in this vault yet.");
                return Ok(Outcome::unchanged(None));
            }
            Lookup::Pick => {
                let chosen = pick::choose_entry(entries)?;
                if chosen.is_none() {
                    output::info("Cancelled.");
                }
                return Ok(Outcome::unchanged(chosen));
            }
        };
        match found {
            Some(entry) => Ok(Outcome::unchanged(Some(entry))),
            None => Err(VaultError::NotFound(match &lookup {
                Lookup::Id(id) => id.to_string(),
                Lookup::Service(s) => s.clone(),
                Lookup::Pick => String::new(),
            })),
        }
    });
    let id = match &result {
        Ok(Some(entry)) => entry.id.to_string(),
        _ => String::new(),
    };
    if !matches!(result, Ok(None)) {
        ctx.record_entry(events::ENTRY_GET, events::ENTRY_GET_FAIL, &id, &result);
    }

    if let Some(entry) = result? {
        reveal(&entry, copy, show);
    }
    Ok(())
}

fn reveal(entry: &CredentialEntry, copy: bool, show: bool) {
    output::print_entry(entry);

    if show {
        let (shown, altered) = output::revealable(&entry.password);
        println!("Password: {}", shown.as_str());
        if altered {
            output::warning(
                "The password contains control characters that were not printed. \
                 Use --copy to get the exact value.",
            );
        }
    } else if copy {
        match clipboard::copy(&entry.password) {
            Ok(()) => println!("Password: {} (copied to clipboard)", output::HIDDEN),
            Err(e) => {
                println!("Password: {}", output::HIDDEN);
                output::warning(&e.to_string());
            }
        }
    } else {
        println!("Password: {}", output::HIDDEN);
        output::tip("Use --copy to copy it to the clipboard, or --show to print it.");
    }
}
