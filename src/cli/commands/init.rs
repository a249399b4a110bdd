//! `credvault init`: create a new vault, replacing an old one on request.

use zeroize::Zeroizing;

use crate::cli::output;
use crate::cli::{confirm, prompt_new_password, prompt_password, Cli, Context};
use crate::errors::Result;
use crate::platform::ProcessLock;

/// Execute the `init` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let ctx = Context::load(cli)?;
    let access = ctx.access();

    if !access.is_initialized()? {
        let master = prompt_new_password(ctx.settings.min_master_length)?;
        return create(&ctx, master);
    }

    output::warning("Found an existing vault.");
    output::warning("Re-initializing PERMANENTLY deletes it and its audit log.");
    if !force && !confirm("Replace the existing vault?")? {
        output::info("Cancelled.");
        return Ok(());
    }

    let current = prompt_password("Current master password")?;
    access.authenticate(current)?;

    let new_master = prompt_new_password(ctx.settings.min_master_length)?;

    // Held until the replacement vault is on disk.
    let lock = ProcessLock::acquire(&ctx.dir.lock_path())?;
    access.purge(&lock, true)?;

    // The audit database was just removed; open a fresh one.
    let fresh = Context::load(cli)?;
    let result = create(&fresh, new_master);
    drop(lock);
    result
}

fn create(ctx: &Context, master: Zeroizing<String>) -> Result<()> {
    let header = ctx.access().initialize(master, ctx.settings.kdf_level)?;

    output::success(&format!(
        "Vault initialized at {}",
        ctx.dir.vault_path().display()
    ));
    output::info(&format!("Vault id: {}", header.vault_id()));
    output::tip("Run `credvault add --service <NAME> --username <USER>` to add a credential.");
    Ok(())
}
