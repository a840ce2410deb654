//! Error types for the Vaultnotes core library.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur within the Vaultnotes core library.
///
/// Vault-wide scans (backlinks, rename propagation) never return these for a
/// single bad file; they log and skip instead. These errors come out of
/// single-target operations such as opening, creating or moving one item.
#[derive(Debug, Error)]
pub enum VaultError {
    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings data could not be serialized or deserialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A note path was requested that does not exist in the vault.
    #[error("Note not found: {0}")]
    NoteNotFound(PathBuf),

    /// A directory delete was attempted on a folder that still has entries.
    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(PathBuf),

    /// The destination of a create, rename or move is already taken.
    #[error("Already exists: {0}")]
    AlreadyExists(PathBuf),

    /// A path points outside the vault root.
    #[error("Path is outside the vault: {0}")]
    OutsideVault(PathBuf),

    /// A user-supplied file or folder name cannot be used.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    /// The chosen vault root is not a usable directory.
    #[error("Invalid vault: {0}")]
    InvalidVault(String),

    /// An editor operation was issued while no note is open.
    #[error("No note is open")]
    NoOpenNote,
}

/// Convenience alias that pins the error type to [`VaultError`].
pub type Result<T> = std::result::Result<T, VaultError>;

impl VaultError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Settings format error: {e}"),
            Self::NoteNotFound(path) => format!("Note no longer exists: {}", path.display()),
            Self::DirectoryNotEmpty(path) => format!(
                "Cannot delete \"{}\" because it is not empty. Delete or move its contents first.",
                display_name(path)
            ),
            Self::AlreadyExists(path) => {
                format!("\"{}\" already exists", display_name(path))
            }
            Self::OutsideVault(path) => {
                format!("{} is not inside the open vault", path.display())
            }
            Self::InvalidName(msg) => msg.clone(),
            Self::InvalidVault(_) => "Could not open vault folder".to_string(),
            Self::NoOpenNote => "Open a note first".to_string(),
        }
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
