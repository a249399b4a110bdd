//! `credvault delete`: remove an entry from the vault.

use crate::audit::events;
use crate::cli::output;
use crate::cli::{confirm, Cli, Context};
use crate::errors::Result;
use crate::validation::validate_entry_id;
use crate::vault::{repository, AccessMode, Outcome};

/// Execute the `delete` command.
pub fn execute(cli: &Cli, id: &str, force: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    let entry_id = ctx.checked(validate_entry_id(id))?;
    ctx.access().require_initialized()?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Delete entry {entry_id}?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    let (access, master) = ctx.unlock_prompt()?;
    let result = access.with_unlocked(master, AccessMode::Standard, |vault| {
        let next = repository::delete(vault.entries(), entry_id)?;
        let remaining = next.len();
        Ok(Outcome::replace(next, remaining))
    });
    ctx.record_entry(events::ENTRY_DELETE, events::ENTRY_DELETE_FAIL, id, &result);
    let remaining = result?;

    output::success(&format!("Deleted entry {entry_id} ({remaining} left)"));
    Ok(())
}
