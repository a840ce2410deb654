use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Returns the note name for `path`: its file name without the markdown extension.
///
/// Names are what wikilinks refer to; `Projects/Plan.md` is named `Plan`.
pub fn note_name(path: &Path) -> Option<String> {
    path.file_stem().and_then(|s| s.to_str()).map(str::to_string)
}

/// A note identified by both its link name and its absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRef {
    pub name: String,
    pub path: PathBuf,
}

impl NoteRef {
    /// Builds a reference from a note path. Returns `None` for paths without a
    /// UTF-8 file stem.
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let name = note_name(&path)?;
        Some(Self { name, path })
    }
}
