//! `credvault purge`: permanently delete the vault.

use crate::cli::output;
use crate::cli::{confirm, prompt_password, Cli, Context};
use crate::errors::Result;
use crate::platform::ProcessLock;

/// Execute the `purge` command.
pub fn execute(cli: &Cli, keep_audit: bool, force: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    let access = ctx.access();

    if !access.is_initialized()? {
        output::info("No vault to purge.");
        return Ok(());
    }

    if !force && !confirm("Permanently delete the vault and every stored credential?")? {
        output::info("Cancelled.");
        return Ok(());
    }

    let master = prompt_password("Master password")?;
    access.authenticate(master)?;

    let lock = ProcessLock::acquire(&ctx.dir.lock_path())?;
    access.purge(&lock, !keep_audit)?;
    drop(lock);

    output::success("Vault deleted");
    if keep_audit {
        output::info(&format!(
            "Audit log kept at {}",
            ctx.dir.audit_path().display()
        ));
    }
    Ok(())
}
