//! Note name to file path lookup.
//!
//! Names share one flat namespace across the vault. When two notes have the
//! same file stem the first one in walk order wins: depth-first, entries
//! sorted by name at every level. [`duplicate_names`] reports such clashes.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::note::{note_name, NoteRef};
use super::storage::Storage;

/// Finds the markdown note called `name` (case-sensitive). `None` means the
/// link is dangling.
pub fn resolve(storage: &Storage, name: &str) -> Option<NoteRef> {
    let found = storage
        .markdown_files()
        .find(|path| note_name(path).as_deref() == Some(name))?;
    log::debug!("Resolved [[{name}]] to {}", found.display());
    NoteRef::from_path(found)
}

/// Note names used by more than one file, with every path in walk order.
pub fn duplicate_names(storage: &Storage) -> BTreeMap<String, Vec<PathBuf>> {
    let mut by_name: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in storage.markdown_files() {
        if let Some(name) = note_name(&path) {
            by_name.entry(name).or_default().push(path);
        }
    }
    by_name.retain(|_, paths| paths.len() > 1);
    by_name
}
