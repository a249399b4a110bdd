//! `credvault add`: store a new credential.

use crate::audit::events;
use crate::cli::output;
use crate::cli::{prompt_text, read_entry_password, Cli, Context};
use crate::errors::Result;
use crate::validation::{
    validate_note, validate_password_bytes, validate_service, validate_username,
};
use crate::vault::{repository, AccessMode, CredentialInput, Outcome};

/// Execute the `add` command.
pub fn execute(
    cli: &Cli,
    service: Option<String>,
    username: Option<String>,
    note: Option<String>,
) -> Result<()> {
    let ctx = Context::load(cli)?;
    ctx.access().require_initialized()?;

    // Validate everything before the master password is asked for.
    let service = ctx.checked(validate_service(&prompt_text("Service", service, false)?))?;
    let username = ctx.checked(validate_username(&prompt_text("Username", username, false)?))?;
    let note = ctx.checked(validate_note(&note.unwrap_or_default()))?;
    let password = read_entry_password()?;
    let password = ctx.checked(validate_password_bytes(&password))?;

    let input = CredentialInput::new(service, username, password, note);

    let (access, master) = ctx.unlock_prompt()?;
    let result = access.with_unlocked(master, AccessMode::Standard, |vault| {
        let (next, created) = repository::add(vault.entries(), &input);
        let total = next.len();
        Ok(Outcome::replace(next, (created.id, total)))
    });
    let id = result.as_ref().map(|(id, _)| id.to_string()).unwrap_or_default();
    ctx.record_entry(events::ENTRY_ADD, events::ENTRY_ADD_FAIL, &id, &result);
    let (_, total) = result?;

    output::success(&format!(
        "Added '{}' ({} total)",
        output::safe(&input.service),
        total
    ));
    output::info(&format!("Entry id: {id}"));
    Ok(())
}
