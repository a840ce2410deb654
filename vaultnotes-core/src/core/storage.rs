//! File-system access for a vault directory.
//!
//! Every read, write and walk the rest of the crate performs goes through
//! [`Storage`]. It knows nothing about links or tags; it only knows which
//! files are notes and how to keep paths inside the vault root.

use crate::{Result, VaultError};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// File extension (without the dot) that marks a file as a note.
pub const MARKDOWN_EXTENSION: &str = "md";

/// Returns `true` if `path` has the markdown extension.
pub fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MARKDOWN_EXTENSION)
}

/// Dot-files and dot-folders (`.git`, `.obsidian`, ...) are never part of the vault view.
pub(crate) fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(is_hidden_name)
            .unwrap_or(false)
}

/// Handle on the vault root directory.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
    // Absolute form of the path the vault was opened through; differs from
    // `root` when that path goes through a symlink.
    opened_as: PathBuf,
}

impl Storage {
    /// Opens `root` as a vault. The path is canonicalized so every path handed
    /// out later is absolute.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidVault`] if `root` does not exist or is not a directory.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let given = root.as_ref();
        let root = fs::canonicalize(given)
            .map_err(|e| VaultError::InvalidVault(format!("{}: {e}", given.display())))?;
        if !root.is_dir() {
            return Err(VaultError::InvalidVault(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        let opened_as = if given.is_absolute() {
            given.to_path_buf()
        } else {
            std::env::current_dir()?.join(given)
        };
        Ok(Self { root, opened_as })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps `path` (absolute, or relative to the root) to an absolute path
    /// inside the vault.
    ///
    /// The check is lexical so it also works for destinations that do not exist yet.
    /// Absolute paths under the directory the vault was opened through are
    /// mapped onto the canonical root.
    pub fn vault_path<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        let joined = match path.strip_prefix(&self.opened_as) {
            Ok(rest) if path.is_absolute() => self.root.join(rest),
            _ => self.root.join(path),
        };
        let escapes = joined
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || !joined.starts_with(&self.root) {
            return Err(VaultError::OutsideVault(path.to_path_buf()));
        }
        Ok(joined)
    }

    pub fn read_note(&self, path: &Path) -> Result<String> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(VaultError::NoteNotFound(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn write_note(&self, path: &Path, text: &str) -> Result<()> {
        fs::write(path, text)?;
        Ok(())
    }

    /// Creates a new note file, refusing to overwrite an existing one.
    pub fn create_note(&self, path: &Path, text: &str) -> Result<()> {
        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(VaultError::AlreadyExists(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(text.as_bytes())?;
        Ok(())
    }

    pub fn create_dir(&self, path: &Path) -> Result<()> {
        if path.exists() {
            return Err(VaultError::AlreadyExists(path.to_path_buf()));
        }
        fs::create_dir(path)?;
        Ok(())
    }

    /// Removes a note or an empty folder.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::DirectoryNotEmpty`] for a folder with any entries
    /// (hidden ones included); nothing is removed in that case.
    pub fn remove(&self, path: &Path) -> Result<()> {
        if path == self.root {
            return Err(VaultError::InvalidName(
                "The vault root cannot be deleted".to_string(),
            ));
        }
        let meta = match fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(VaultError::NoteNotFound(path.to_path_buf()))
            }
            Err(e) => return Err(e.into()),
        };
        if meta.is_dir() {
            if fs::read_dir(path)?.next().is_some() {
                return Err(VaultError::DirectoryNotEmpty(path.to_path_buf()));
            }
            fs::remove_dir(path)?;
        } else {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Moves `from` to `to`, refusing to replace an existing entry.
    pub fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        if !from.exists() {
            return Err(VaultError::NoteNotFound(from.to_path_buf()));
        }
        if to.exists() {
            return Err(VaultError::AlreadyExists(to.to_path_buf()));
        }
        fs::rename(from, to)?;
        Ok(())
    }

    /// Every markdown file under the root, depth-first with entries sorted by
    /// name at each level. Unreadable directory entries are logged and skipped.
    pub fn markdown_files(&self) -> impl Iterator<Item = PathBuf> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e))
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    log::warn!("Skipping unreadable vault entry: {e}");
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && is_markdown(e.path()))
            .map(DirEntry::into_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vault() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path()).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_open_rejects_missing_directory() {
        let dir = TempDir::new().unwrap();
        let result = Storage::open(dir.path().join("nope"));
        assert!(matches!(result, Err(VaultError::InvalidVault(_))));
    }

    #[test]
    fn test_open_rejects_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.md");
        fs::write(&file, "").unwrap();
        assert!(matches!(Storage::open(&file), Err(VaultError::InvalidVault(_))));
    }

    #[test]
    fn test_markdown_files_sorted_depth_first_and_filtered() {
        let (_dir, storage) = vault();
        let root = storage.root().to_path_buf();
        fs::create_dir(root.join("b")).unwrap();
        fs::create_dir(root.join(".hidden")).unwrap();
        fs::write(root.join("c.md"), "").unwrap();
        fs::write(root.join("a.md"), "").unwrap();
        fs::write(root.join("b/z.md"), "").unwrap();
        fs::write(root.join("b/notes.txt"), "").unwrap();
        fs::write(root.join(".hidden/secret.md"), "").unwrap();

        let files: Vec<PathBuf> = storage.markdown_files().collect();
        assert_eq!(
            files,
            vec![root.join("a.md"), root.join("b/z.md"), root.join("c.md")]
        );
    }

    #[test]
    fn test_vault_path_rejects_escape() {
        let (_dir, storage) = vault();
        assert!(matches!(
            storage.vault_path("../outside.md"),
            Err(VaultError::OutsideVault(_))
        ));
        assert!(matches!(
            storage.vault_path("/etc/passwd"),
            Err(VaultError::OutsideVault(_))
        ));
        let inside = storage.vault_path("dir/note.md").unwrap();
        assert_eq!(inside, storage.root().join("dir/note.md"));
    }

    #[cfg(unix)]
    #[test]
    fn test_vault_path_accepts_symlinked_root() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        fs::write(real.join("a.md"), "").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let storage = Storage::open(&link).unwrap();
        let mapped = storage.vault_path(link.join("a.md")).unwrap();
        assert_eq!(mapped, storage.root().join("a.md"));
        assert!(storage.vault_path(link.join("../real/a.md")).is_err());
        assert!(matches!(
            storage.vault_path(dir.path().join("elsewhere.md")),
            Err(VaultError::OutsideVault(_))
        ));
    }

    #[test]
    fn test_create_note_does_not_overwrite() {
        let (_dir, storage) = vault();
        let path = storage.root().join("n.md");
        storage.create_note(&path, "first").unwrap();
        let again = storage.create_note(&path, "second");
        assert!(matches!(again, Err(VaultError::AlreadyExists(_))));
        assert_eq!(storage.read_note(&path).unwrap(), "first");
    }

    #[test]
    fn test_remove_non_empty_directory_is_rejected() {
        let (_dir, storage) = vault();
        let folder = storage.root().join("Projects");
        fs::create_dir(&folder).unwrap();
        fs::write(folder.join("x.md"), "keep").unwrap();

        let result = storage.remove(&folder);
        assert!(matches!(result, Err(VaultError::DirectoryNotEmpty(_))));
        assert!(folder.join("x.md").exists());

        storage.remove(&folder.join("x.md")).unwrap();
        storage.remove(&folder).unwrap();
        assert!(!folder.exists());
    }

    #[test]
    fn test_read_missing_note_is_not_found() {
        let (_dir, storage) = vault();
        let result = storage.read_note(&storage.root().join("ghost.md"));
        assert!(matches!(result, Err(VaultError::NoteNotFound(_))));
    }
}
