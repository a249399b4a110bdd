//! `credvault update`: change fields of an existing entry.
//!
//! With `--id` the flags say what changes.  Without it the entry is
//! picked from a list, and if no flags were given either, an edit menu
//! queues changes until they are saved.

use zeroize::Zeroizing;

use crate::audit::events;
use crate::cli::{output, pick};
use crate::cli::{prompt_entry_password, prompt_text, read_entry_password, Cli, Context};
use crate::errors::{Result, VaultError};
use crate::validation::{
    validate_entry_id, validate_note, validate_password_bytes, validate_service,
    validate_username,
};
use crate::vault::{repository, AccessMode, CredentialEntry, EntryChanges, Outcome};

/// Execute the `update` command.
pub fn execute(
    cli: &Cli,
    id: Option<&str>,
    service: Option<&str>,
    username: Option<&str>,
    note: Option<&str>,
    password: bool,
) -> Result<()> {
    let ctx = Context::load(cli)?;
    let entry_id = id.map(|raw| ctx.checked(validate_entry_id(raw))).transpose()?;

    let mut changes = EntryChanges::default();
    if let Some(s) = service {
        changes.service = Some(ctx.checked(validate_service(s))?);
    }
    if let Some(u) = username {
        changes.username = Some(ctx.checked(validate_username(u))?);
    }
    if let Some(n) = note {
        changes.note = Some(ctx.checked(validate_note(n))?);
    }

    let Some(entry_id) = entry_id else {
        return interactive(&ctx, changes, password);
    };

    if changes.is_empty() && !password {
        let err: Result<()> = Err(VaultError::NothingToUpdate);
        ctx.record_entry(
            events::ENTRY_UPDATE,
            events::ENTRY_UPDATE_FAIL,
            &entry_id.to_string(),
            &err,
        );
        output::tip("Pass at least one of --service, --username, --note or --password.");
        return err;
    }

    ctx.access().require_initialized()?;
    if password {
        let raw = read_entry_password()?;
        changes.password = Some(ctx.checked(validate_password_bytes(&raw))?.into());
    }

    let (access, master) = ctx.unlock_prompt()?;
    let result = access.with_unlocked(master, AccessMode::Standard, |vault| {
        let (next, updated) = repository::update(vault.entries(), entry_id, &changes)?;
        Ok(Outcome::replace(next, updated))
    });
    ctx.record_entry(
        events::ENTRY_UPDATE,
        events::ENTRY_UPDATE_FAIL,
        &entry_id.to_string(),
        &result,
    );
    let updated = result?;

    output::success(&format!(
        "Updated '{}' ({})",
        output::safe(&updated.service),
        updated.id
    ));
    Ok(())
}

/// Pick the entry from a list, then apply the flags or run the edit menu.
fn interactive(ctx: &Context, mut changes: EntryChanges, password: bool) -> Result<()> {
    let (access, master) = ctx.unlock_prompt()?;
    let result = access.with_unlocked(master, AccessMode::ReadReseal, |vault| {
        let entries = vault.entries();
        if entries.is_empty() {
            output::info("No entries in this vault yet.");
            return Ok(Outcome::unchanged(None));
        }
        let Some(entry) = pick::choose_entry(entries)? else {
            output::info("Cancelled.");
            return Ok(Outcome::unchanged(None));
        };

        output::print_entry(&entry);
        println!("Password: {}", output::HIDDEN);

        if password {
            let raw = prompt_entry_password()?;
            changes.password = Some(ctx.checked(validate_password_bytes(&raw))?.into());
        }
        if changes.is_empty() && !edit_menu(ctx, &mut changes)? {
            output::info("Cancelled.");
            return Ok(Outcome::unchanged(None));
        }

        let (next, updated) = repository::update(entries, entry.id, &changes)?;
        Ok(Outcome::replace(next, Some(updated)))
    });

    let id = match &result {
        Ok(Some(entry)) => entry.id.to_string(),
        _ => String::new(),
    };
    if !matches!(result, Ok(None)) {
        ctx.record_entry(events::ENTRY_UPDATE, events::ENTRY_UPDATE_FAIL, &id, &result);
    }

    if let Some(updated) = result? {
        print_updated(&updated, &changes);
    }
    Ok(())
}

const MENU: [&str; 6] = ["Service", "Username", "Password", "Note", "Save", "Cancel"];

/// Queue changes until the user saves (`true`) or cancels (`false`).
///
/// Rejected values are reported and the menu shown again.
fn edit_menu(ctx: &Context, changes: &mut EntryChanges) -> Result<bool> {
    let items: Vec<String> = MENU.iter().map(|s| (*s).to_string()).collect();
    loop {
        let choice = pick::select("Edit", &items)?;
        let queued = match choice.map(|i| MENU[i]) {
            Some("Service") => {
                let raw = prompt_text("New service", None, false)?;
                ctx.checked(validate_service(&raw))
                    .map(|v| changes.service = Some(v))
            }
            Some("Username") => {
                let raw = prompt_text("New username", None, false)?;
                ctx.checked(validate_username(&raw))
                    .map(|v| changes.username = Some(v))
            }
            Some("Password") => {
                let raw = prompt_entry_password()?;
                ctx.checked(validate_password_bytes(&raw))
                    .map(|v| changes.password = Some(Zeroizing::new(v)))
            }
            Some("Note") => {
                let raw = prompt_text("New note (optional)", None, true)?;
                ctx.checked(validate_note(&raw)).map(|v| changes.note = Some(v))
            }
            Some("Save") if changes.is_empty() => {
                output::warning("Nothing to update yet.");
                continue;
            }
            Some("Save") => return Ok(true),
            _ => return Ok(false),
        };

        match queued {
            Ok(()) => output::success("Queued"),
            Err(e) => output::error(&e.to_string()),
        }
    }
}

fn print_updated(updated: &CredentialEntry, changes: &EntryChanges) {
    output::success("Entry updated");
    output::print_entry(updated);
    if changes.password.is_some() {
        println!("Password: [updated]");
    } else {
        println!("Password: {}", output::HIDDEN);
    }
}
