//! Interactive selection of an entry when no `--id` was given.
//!
//! Runs inside an unlocked transaction: the lists shown are built from
//! the decrypted entries and dropped with them.

use dialoguer::Select;

use crate::cli::output;
use crate::errors::{Result, VaultError};
use crate::vault::{repository, CredentialEntry};

/// Distinct service names, sorted case-insensitively.
pub fn services(entries: &[CredentialEntry]) -> Vec<String> {
    let mut names: Vec<String> = entries.iter().map(|e| e.service.clone()).collect();
    names.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
    names.dedup();
    names
}

/// One line per candidate: username and the start of the id.
pub fn entry_labels(candidates: &[&CredentialEntry]) -> Vec<String> {
    candidates
        .iter()
        .map(|e| {
            let id = e.id.to_string();
            format!("{} [{}]", output::safe(&e.username), &id[..8])
        })
        .collect()
}

/// Ask for a service, then for one of its entries when there are several.
///
/// `Ok(None)` means the user backed out.
pub fn choose_entry(entries: &[CredentialEntry]) -> Result<Option<CredentialEntry>> {
    let names = services(entries);
    let shown: Vec<String> = names.iter().map(|s| output::safe(s)).collect();

    let Some(index) = select("Choose service", &shown)? else {
        return Ok(None);
    };
    let candidates = repository::list(entries, Some(names[index].as_str()));

    match candidates.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some((*only).clone())),
        several => {
            let labels = entry_labels(several);
            Ok(select("Choose entry", &labels)?.map(|i| several[i].clone()))
        }
    }
}

/// Arrow-key menu; Esc or `q` returns `None`.
pub fn select(prompt: &str, items: &[String]) -> Result<Option<usize>> {
    Select::new()
        .with_prompt(prompt)
        .items(items)
        .default(0)
        .interact_opt()
        .map_err(|e| VaultError::CommandFailed(format!("selection prompt: {e}")))
}
