//! `credvault unlock`: verify the master password and summarize the vault.
//!
//! Nothing stays unlocked afterwards: the key and plaintext are wiped as
//! soon as the summary has been read.

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;
use crate::vault::{AccessMode, Outcome};

/// Execute the `unlock` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let (access, master) = ctx.unlock_prompt()?;

    let (count, header) = access.with_unlocked(master, AccessMode::Standard, |vault| {
        Ok(Outcome::unchanged((
            vault.entries().len(),
            vault.header().clone(),
        )))
    })?;

    output::success("Vault unlocked");
    println!("Entries: {count}");
    println!("Vault id: {}", header.vault_id());
    println!("KDF: {} ({})", header.kdf().algorithm(), header.kdf().ops_level());
    println!("Created: {}", output::timestamp(&header.created_at()));
    println!("Updated: {}", output::timestamp(&header.updated_at()));
    output::info("Vault locked again; secrets were cleared from memory.");

    Ok(())
}
