//! Hierarchical listing of a vault for the browser pane.
//!
//! [`build_tree`] walks the whole vault. [`VaultIndex`] keeps the last tree
//! around and, after a create/rename/move/delete, re-walks only the folder
//! that changed instead of the whole vault.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::storage::{is_hidden_name, is_markdown};
use crate::Result;

/// A folder or note in the vault tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultNode {
    /// File or folder name as shown in the browser (notes keep their extension).
    pub name: String,
    /// Absolute path; the identifier for open, rename, move, delete and backlinks.
    pub path: PathBuf,
    pub is_dir: bool,
    /// Sorted by name; always empty for notes.
    pub children: Vec<VaultNode>,
}

impl VaultNode {
    /// Finds the node for `path` in this subtree.
    pub fn find(&self, path: &Path) -> Option<&VaultNode> {
        if self.path == path {
            return Some(self);
        }
        self.children
            .iter()
            .filter(|c| path.starts_with(&c.path))
            .find_map(|c| c.find(path))
    }

    fn find_dir_mut(&mut self, path: &Path) -> Option<&mut VaultNode> {
        if self.path == path {
            return if self.is_dir { Some(self) } else { None };
        }
        self.children
            .iter_mut()
            .filter(|c| c.is_dir && path.starts_with(&c.path))
            .find_map(|c| c.find_dir_mut(path))
    }

    /// Number of notes in this subtree.
    pub fn note_count(&self) -> usize {
        if self.is_dir {
            self.children.iter().map(VaultNode::note_count).sum()
        } else {
            1
        }
    }
}

/// Walks `root` recursively and returns its folders and markdown notes.
///
/// # Errors
///
/// Fails only if `root` itself cannot be listed. Unreadable subfolders are
/// logged and shown without children.
pub fn build_tree(root: &Path) -> Result<VaultNode> {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    let children = read_children(root)?;
    Ok(VaultNode {
        name,
        path: root.to_path_buf(),
        is_dir: true,
        children,
    })
}

fn read_children(dir: &Path) -> Result<Vec<VaultNode>> {
    let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)?
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(e) => {
                log::warn!("Skipping unreadable entry in {}: {e}", dir.display());
                None
            }
        })
        .collect();
    entries.sort_by_key(fs::DirEntry::file_name);

    let mut children = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_hidden_name(&name) {
            continue;
        }
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            let grandchildren = read_children(&path).unwrap_or_else(|e| {
                log::warn!("Could not list {}: {e}", path.display());
                Vec::new()
            });
            children.push(VaultNode {
                name,
                path,
                is_dir: true,
                children: grandchildren,
            });
        } else if is_markdown(&path) {
            children.push(VaultNode {
                name,
                path,
                is_dir: false,
                children: Vec::new(),
            });
        }
    }
    Ok(children)
}

/// Memoized [`build_tree`] for one vault root.
#[derive(Debug)]
pub struct VaultIndex {
    root: PathBuf,
    tree: Option<VaultNode>,
}

impl VaultIndex {
    pub fn new(root: PathBuf) -> Self {
        Self { root, tree: None }
    }

    /// Returns the cached tree, walking the vault first if nothing is cached.
    pub fn tree(&mut self) -> Result<&VaultNode> {
        let tree = match self.tree.take() {
            Some(tree) => tree,
            None => build_tree(&self.root)?,
        };
        Ok(self.tree.insert(tree))
    }

    /// Discards the cache and walks the whole vault again.
    pub fn refresh(&mut self) -> Result<&VaultNode> {
        self.tree = None;
        self.tree()
    }

    /// Marks `path` as created, removed or renamed. Only the folder containing
    /// it is re-listed; if that folder is not in the cache the whole tree is
    /// dropped and rebuilt on next access.
    pub fn invalidate(&mut self, path: &Path) {
        let Some(tree) = self.tree.as_mut() else {
            return;
        };
        let parent = match path.parent() {
            Some(p) if path != self.root => p,
            _ => {
                self.tree = None;
                return;
            }
        };
        let Some(node) = tree.find_dir_mut(parent) else {
            log::debug!("{} not cached; dropping vault tree", parent.display());
            self.tree = None;
            return;
        };
        match read_children(parent) {
            Ok(children) => {
                log::debug!("Re-listed {}", parent.display());
                node.children = children;
            }
            Err(e) => {
                log::warn!("Could not re-list {}: {e}", parent.display());
                self.tree = None;
            }
        }
    }
}
