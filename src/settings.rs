//! Install-time backfill of the default settings table.

use crate::ledger::Key;
use crate::store::{KeyValueStore, StoreError};

/// Writes the install default of every key that is currently absent.
///
/// Existing values are never overwritten, so this is safe to run on every
/// startup. Returns the keys that were written.
pub async fn install_defaults<S: KeyValueStore + ?Sized>(
    store: &S,
) -> Result<Vec<Key>, StoreError> {
    let mut written = Vec::new();

    for key in Key::ALL {
        let Some(default) = key.install_default() else {
            continue;
        };
        if store.get(key.as_str()).await?.is_some() {
            continue;
        }
        store.set(key.as_str(), default).await?;
        written.push(key);
    }

    if !written.is_empty() {
        tracing::info!(count = written.len(), "installed default settings");
    }
    Ok(written)
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
