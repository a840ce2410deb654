//! Keeps wikilinks pointing at a note when the note is renamed or moved.
//!
//! [`propagate_rename`] must run before the file is moved: it derives both
//! names from the paths and rewrites the other notes in place. A failure on
//! one note is logged and recorded, and the remaining notes are still
//! processed, so a partially applied rename is possible and reported.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::links::rewrite_link_targets;
use super::note::note_name;
use super::settings::LinkMatching;
use super::storage::Storage;

/// A note whose links could not be rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRewrite {
    pub path: PathBuf,
    pub error: String,
}

/// What a rename propagation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameReport {
    pub old_name: String,
    pub new_name: String,
    /// Notes written back with updated links.
    pub rewritten: Vec<PathBuf>,
    pub failed: Vec<FailedRewrite>,
}

impl RenameReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Replaces bare `[[old]]` with `[[new]]`. Embeds (`![[old]]`) and labeled
/// links are left as they are. Returns `None` when nothing changed.
pub fn rewrite_literal(text: &str, old: &str, new: &str) -> Option<String> {
    let pattern = format!("[[{old}]]");
    let replacement = format!("[[{new}]]");
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (idx, _) in text.match_indices(&pattern) {
        if text[..idx].ends_with('!') {
            continue;
        }
        out.push_str(&text[last..idx]);
        out.push_str(&replacement);
        last = idx + pattern.len();
    }
    if last == 0 {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}

fn rewrite(text: &str, old: &str, new: &str, matching: LinkMatching) -> Option<String> {
    match matching {
        LinkMatching::Literal => rewrite_literal(text, old, new),
        LinkMatching::Structural => rewrite_link_targets(text, old, new),
    }
}

/// Rewrites every reference to the note at `old_path` so it names the note
/// at `new_path`. Only notes whose text actually changes are written.
///
/// Moving a note to another folder without changing its name is a no-op.
pub fn propagate_rename(
    storage: &Storage,
    old_path: &Path,
    new_path: &Path,
    matching: LinkMatching,
) -> RenameReport {
    let (Some(old_name), Some(new_name)) = (note_name(old_path), note_name(new_path)) else {
        return RenameReport::default();
    };
    let mut report = RenameReport {
        old_name,
        new_name,
        ..RenameReport::default()
    };
    if report.old_name == report.new_name {
        return report;
    }

    for path in storage.markdown_files() {
        let text = match storage.read_note(&path) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("Could not read {} while renaming links: {e}", path.display());
                report.failed.push(FailedRewrite {
                    path,
                    error: e.to_string(),
                });
                continue;
            }
        };
        let Some(updated) = rewrite(&text, &report.old_name, &report.new_name, matching) else {
            continue;
        };
        if updated == text {
            continue;
        }
        match storage.write_note(&path, &updated) {
            Ok(()) => report.rewritten.push(path),
            Err(e) => {
                log::warn!("Could not rewrite links in {}: {e}", path.display());
                report.failed.push(FailedRewrite {
                    path,
                    error: e.to_string(),
                });
            }
        }
    }

    log::info!(
        "Renamed links [[{}]] -> [[{}]] in {} note(s), {} failure(s)",
        report.old_name,
        report.new_name,
        report.rewritten.len(),
        report.failed.len()
    );
    report
}
