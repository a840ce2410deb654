//! Which notes link to a given note.
//!
//! Nothing is cached: every call reads every note in the vault.

use super::links::find_links;
use super::note::{note_name, NoteRef};
use super::settings::LinkMatching;
use super::storage::Storage;

/// Returns `true` if `text` references the note called `name`.
pub fn references(text: &str, name: &str, matching: LinkMatching) -> bool {
    match matching {
        LinkMatching::Literal => {
            text.contains(&format!("[[{name}]]")) || text.contains(&format!("![[{name}]]"))
        }
        LinkMatching::Structural => find_links(text).iter().any(|l| l.target == name),
    }
}

/// Notes that reference `name`, in vault walk order. Notes called `name`
/// themselves are left out.
///
/// A note that cannot be read is logged and skipped.
pub fn backlinks_of(storage: &Storage, name: &str, matching: LinkMatching) -> Vec<NoteRef> {
    if name.is_empty() {
        return Vec::new();
    }
    let mut found = Vec::new();
    for path in storage.markdown_files() {
        let Some(source) = note_name(&path) else {
            continue;
        };
        if source == name {
            continue;
        }
        match storage.read_note(&path) {
            Ok(text) if references(&text, name, matching) => found.push(NoteRef { name: source, path }),
            Ok(_) => {}
            Err(e) => log::warn!("Skipping {} during backlink scan: {e}", path.display()),
        }
    }
    log::debug!("{} backlink(s) to [[{name}]]", found.len());
    found
}
