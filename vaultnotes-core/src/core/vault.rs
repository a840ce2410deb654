//! High-level operations over an open vault directory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{
    backlinks_of, duplicate_names, propagate_rename, resolve, NoteRef, RenameReport, Result,
    Storage, VaultConfig, VaultError, VaultIndex, VaultNode, MARKDOWN_EXTENSION,
};

/// The result of renaming or moving a note or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResult {
    pub old_path: PathBuf,
    pub new_path: PathBuf,
    /// Link rewrites done before the move. Empty for folders and for moves
    /// that keep the note's name.
    pub links: RenameReport,
}

/// An open vault: a root directory of markdown notes.
///
/// `Vault` is the interface for every structural change (create, rename,
/// move, delete) and for the vault-wide lookups (resolve, backlinks). It
/// keeps a memoized folder tree and invalidates the affected folder after
/// each change. Link and tag state is never cached.
#[derive(Debug)]
pub struct Vault {
    storage: Storage,
    index: VaultIndex,
    config: VaultConfig,
}

impl Vault {
    /// Opens the directory at `root` as a vault.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidVault`] if `root` is not an existing directory.
    pub fn open<P: AsRef<Path>>(root: P, config: VaultConfig) -> Result<Self> {
        let storage = Storage::open(root)?;
        let index = VaultIndex::new(storage.root().to_path_buf());
        log::info!("Opened vault at {}", storage.root().display());
        Ok(Self {
            storage,
            index,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        self.storage.root()
    }

    pub fn config(&self) -> VaultConfig {
        self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The folder tree, walked on first use and after invalidations.
    pub fn tree(&mut self) -> Result<&VaultNode> {
        self.index.tree()
    }

    /// Walks the whole vault again, discarding the cached tree.
    pub fn refresh(&mut self) -> Result<&VaultNode> {
        self.index.refresh()
    }

    /// Absolute in-vault path for `path` (absolute, or relative to the root).
    pub fn vault_path<P: AsRef<Path>>(&self, path: P) -> Result<PathBuf> {
        self.storage.vault_path(path)
    }

    pub fn read_note(&self, path: &Path) -> Result<String> {
        self.storage.read_note(path)
    }

    pub fn write_note(&self, path: &Path, text: &str) -> Result<()> {
        self.storage.write_note(path, text)
    }

    /// Finds the note called `name`; `None` for a dangling link.
    pub fn resolve(&self, name: &str) -> Option<NoteRef> {
        resolve(&self.storage, name)
    }

    /// Notes linking to the note called `name`.
    pub fn backlinks_of(&self, name: &str) -> Vec<NoteRef> {
        backlinks_of(&self.storage, name, self.config.link_matching)
    }

    /// Note names shared by more than one file.
    pub fn duplicate_names(&self) -> BTreeMap<String, Vec<PathBuf>> {
        duplicate_names(&self.storage)
    }

    /// Creates an empty note named `note_<unix seconds>.md` in `dir` (the
    /// root if `None`).
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::AlreadyExists`] if a note was already created in
    /// the same second; the existing file is left untouched.
    pub fn create_note(&mut self, dir: Option<&Path>) -> Result<PathBuf> {
        let dir = self.folder_path(dir)?;
        let path = dir.join(new_note_file_name(chrono::Utc::now().timestamp()));
        self.storage.create_note(&path, "")?;
        self.index.invalidate(&path);
        log::info!("Created note {}", path.display());
        Ok(path)
    }

    /// Creates the folder `name` inside `parent` (the root if `None`).
    pub fn create_folder(&mut self, parent: Option<&Path>, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let path = self.folder_path(parent)?.join(name);
        self.storage.create_dir(&path)?;
        self.index.invalidate(&path);
        log::info!("Created folder {}", path.display());
        Ok(path)
    }

    /// Deletes a note or an empty folder.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::DirectoryNotEmpty`] for a folder that still has
    /// entries; the vault is left unchanged.
    pub fn delete(&mut self, path: &Path) -> Result<()> {
        let path = self.vault_path(path)?;
        self.storage.remove(&path)?;
        self.index.invalidate(&path);
        log::info!("Deleted {}", path.display());
        Ok(())
    }

    /// Renames a note or folder in place. For notes `new_name` may omit the
    /// `.md` extension. Links to a renamed note are rewritten first.
    pub fn rename(&mut self, path: &Path, new_name: &str) -> Result<MoveResult> {
        validate_name(new_name)?;
        let old_path = self.vault_path(path)?;
        let parent = old_path
            .parent()
            .filter(|_| old_path != self.root())
            .ok_or_else(|| VaultError::InvalidName("The vault root cannot be renamed".into()))?;
        let file_name = if old_path.is_dir() {
            new_name.to_string()
        } else {
            with_markdown_extension(new_name)
        };
        let new_path = parent.join(file_name);
        self.relocate(old_path, new_path)
    }

    /// Moves a note or folder into `dest_dir`, keeping its name.
    pub fn move_item(&mut self, path: &Path, dest_dir: &Path) -> Result<MoveResult> {
        let old_path = self.vault_path(path)?;
        let dest_dir = self.folder_path(Some(dest_dir))?;
        if old_path == self.root() {
            return Err(VaultError::InvalidName("The vault root cannot be moved".into()));
        }
        if dest_dir.starts_with(&old_path) {
            return Err(VaultError::InvalidName(
                "A folder cannot be moved into itself".into(),
            ));
        }
        let file_name = old_path
            .file_name()
            .ok_or_else(|| VaultError::InvalidName(old_path.display().to_string()))?;
        let new_path = dest_dir.join(file_name);
        self.relocate(old_path, new_path)
    }

    fn relocate(&mut self, old_path: PathBuf, new_path: PathBuf) -> Result<MoveResult> {
        if !old_path.exists() {
            return Err(VaultError::NoteNotFound(old_path));
        }
        if new_path == old_path {
            return Ok(MoveResult {
                old_path,
                new_path,
                links: RenameReport::default(),
            });
        }
        if new_path.exists() {
            return Err(VaultError::AlreadyExists(new_path));
        }

        let links = if old_path.is_file() {
            propagate_rename(
                &self.storage,
                &old_path,
                &new_path,
                self.config.link_matching,
            )
        } else {
            RenameReport::default()
        };

        self.storage.rename(&old_path, &new_path)?;
        self.index.invalidate(&old_path);
        self.index.invalidate(&new_path);
        log::info!("Moved {} to {}", old_path.display(), new_path.display());
        Ok(MoveResult {
            old_path,
            new_path,
            links,
        })
    }

    /// Resolves an optional folder argument to an existing in-vault directory.
    fn folder_path(&self, dir: Option<&Path>) -> Result<PathBuf> {
        let dir = match dir {
            Some(d) => self.vault_path(d)?,
            None => self.root().to_path_buf(),
        };
        if !dir.is_dir() {
            return Err(VaultError::NoteNotFound(dir));
        }
        Ok(dir)
    }
}

/// File name for a note created at `timestamp` (unix seconds).
pub fn new_note_file_name(timestamp: i64) -> String {
    format!("note_{timestamp}.{MARKDOWN_EXTENSION}")
}

fn with_markdown_extension(name: &str) -> String {
    if Path::new(name).extension().and_then(|e| e.to_str()) == Some(MARKDOWN_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}.{MARKDOWN_EXTENSION}")
    }
}

/// Rejects names that are empty, hidden, or would escape their folder.
fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(VaultError::InvalidName("Name cannot be empty".into()));
    }
    if trimmed.starts_with('.') {
        return Err(VaultError::InvalidName(format!(
            "\"{name}\" cannot start with a dot"
        )));
    }
    if name.contains(|c: char| c == '/' || c == '\\') {
        return Err(VaultError::InvalidName(format!(
            "\"{name}\" cannot contain path separators"
        )));
    }
    Ok(())
}
