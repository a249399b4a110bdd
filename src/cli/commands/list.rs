//! `credvault list`: display entries in a table, without passwords.

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;
use crate::validation::validate_service;
use crate::vault::{repository, AccessMode, Outcome};

/// Execute the `list` command.
pub fn execute(cli: &Cli, service: Option<&str>) -> Result<()> {
    let ctx = Context::load(cli)?;
    let filter = match service {
        Some(s) => Some(ctx.checked(validate_service(s))?),
        None => None,
    };

    let (access, master) = ctx.unlock_prompt()?;
    let entries = access.with_unlocked(master, AccessMode::Standard, |vault| {
        let matching = repository::list(vault.entries(), filter.as_deref())
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        Ok(Outcome::unchanged(matching))
    })?;

    match &filter {
        Some(f) => output::info(&format!(
            "{} entr{} for '{}'",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" },
            output::safe(f)
        )),
        None => output::info(&format!(
            "{} entr{}",
            entries.len(),
            if entries.len() == 1 { "y" } else { "ies" }
        )),
    }
    output::print_entries_table(&entries);

    Ok(())
}
