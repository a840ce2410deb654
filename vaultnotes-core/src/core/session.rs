//! The single active editing context: one vault, at most one open note.
//!
//! A host (GUI shell, CLI) turns user actions, link activations and timer
//! ticks into [`Command`]s and feeds them to [`Session::dispatch`]. Every
//! panel the session returns is computed from the vault's files and the
//! current editor text at that moment; nothing is carried over between calls.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    extract_tags, find_links, note_name, render_preview, target_from_href, Link, MoveResult,
    NoteRef, Result, Vault, VaultError, VaultNode,
};

/// The note currently loaded in the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenNote {
    pub path: PathBuf,
    pub name: String,
    /// Editor text; may be ahead of the file until the next autosave.
    pub text: String,
}

/// Panels derived from the editor text alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub tags: Vec<String>,
    pub links: Vec<Link>,
    pub html: String,
}

impl Preview {
    pub fn of(text: &str) -> Self {
        Self {
            tags: extract_tags(text).into_iter().collect(),
            links: find_links(text),
            html: render_preview(text),
        }
    }
}

/// Everything the UI shows after a note is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub path: PathBuf,
    pub name: String,
    pub text: String,
    #[serde(flatten)]
    pub preview: Preview,
    pub backlinks: Vec<NoteRef>,
}

/// A user action, preview event or timer tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open the note at this path (from the browser pane).
    OpenNote(PathBuf),
    /// The editor text changed.
    Edit(String),
    /// A wikilink with this target was activated in the preview.
    ActivateLink(String),
    /// The preview navigated to this `href`.
    Navigate(String),
    /// The autosave timer fired.
    AutosaveTick,
    NewNote { dir: Option<PathBuf> },
    NewFolder { parent: Option<PathBuf>, name: String },
    Rename { path: PathBuf, new_name: String },
    Move { path: PathBuf, dest_dir: PathBuf },
    Delete(PathBuf),
    /// Re-walk the whole vault.
    Refresh,
}

/// What a command produced, for the host to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Opened(NoteView),
    Previewed(Preview),
    Saved(PathBuf),
    Created(PathBuf),
    Moved(MoveResult),
    Deleted(PathBuf),
    Tree(VaultNode),
    /// Nothing to do: a dangling link, a foreign href, or a tick with no open note.
    Ignored,
}

/// Host-side state for one vault window.
#[derive(Debug)]
pub struct Session {
    vault: Vault,
    current: Option<OpenNote>,
}

impl Session {
    pub fn new(vault: Vault) -> Self {
        Self {
            vault,
            current: None,
        }
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn vault_mut(&mut self) -> &mut Vault {
        &mut self.vault
    }

    pub fn current(&self) -> Option<&OpenNote> {
        self.current.as_ref()
    }

    /// Runs one command. Errors from single-target operations are returned
    /// for the host to show; a dangling link is [`Outcome::Ignored`].
    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        log::debug!("dispatch {command:?}");
        match command {
            Command::OpenNote(path) => self.open_note(&path).map(Outcome::Opened),
            Command::Edit(text) => self.edit(text).map(Outcome::Previewed),
            Command::ActivateLink(target) => Ok(self
                .activate_link(&target)?
                .map_or(Outcome::Ignored, Outcome::Opened)),
            Command::Navigate(href) => Ok(self
                .handle_href(&href)?
                .map_or(Outcome::Ignored, Outcome::Opened)),
            Command::AutosaveTick => Ok(self.autosave()?.map_or(Outcome::Ignored, Outcome::Saved)),
            Command::NewNote { dir } => self.vault.create_note(dir.as_deref()).map(Outcome::Created),
            Command::NewFolder { parent, name } => self
                .vault
                .create_folder(parent.as_deref(), &name)
                .map(Outcome::Created),
            Command::Rename { path, new_name } => self.rename(&path, &new_name).map(Outcome::Moved),
            Command::Move { path, dest_dir } => self.move_item(&path, &dest_dir).map(Outcome::Moved),
            Command::Delete(path) => self.delete(&path).map(Outcome::Deleted),
            Command::Refresh => Ok(Outcome::Tree(self.vault.refresh()?.clone())),
        }
    }

    /// Loads a note into the editor and computes all of its panels. The
    /// previously open note is saved first. Opening the note that is already
    /// open keeps the editor text as it is.
    pub fn open_note(&mut self, path: &Path) -> Result<NoteView> {
        let path = self.vault.vault_path(path)?;
        if self.current.as_ref().is_some_and(|c| c.path == path) {
            return self.view();
        }
        let name = note_name(&path).ok_or_else(|| VaultError::NoteNotFound(path.clone()))?;
        let text = self.vault.read_note(&path)?;
        if self.current.is_some() {
            self.autosave()?;
        }
        log::info!("Opened note {}", path.display());
        self.current = Some(OpenNote { path, name, text });
        self.view()
    }

    /// Replaces the editor text and recomputes the text-derived panels.
    /// Nothing is written until the next autosave.
    pub fn edit(&mut self, text: String) -> Result<Preview> {
        let current = self.current.as_mut().ok_or(VaultError::NoOpenNote)?;
        current.text = text;
        Ok(Preview::of(&current.text))
    }

    /// The link-activation entry point of the preview. Returns `None`, and
    /// changes nothing, when no note has that name.
    pub fn activate_link(&mut self, target: &str) -> Result<Option<NoteView>> {
        match self.vault.resolve(target) {
            Some(note) => self.open_note(&note.path).map(Some),
            None => {
                log::debug!("Ignoring dangling link [[{target}]]");
                Ok(None)
            }
        }
    }

    /// Like [`Session::activate_link`], starting from a preview anchor's `href`.
    pub fn handle_href(&mut self, href: &str) -> Result<Option<NoteView>> {
        match target_from_href(href) {
            Some(target) => self.activate_link(&target),
            None => Ok(None),
        }
    }

    /// Writes the editor text to the open note, changed or not.
    pub fn autosave(&self) -> Result<Option<PathBuf>> {
        let Some(current) = self.current.as_ref() else {
            return Ok(None);
        };
        self.vault.write_note(&current.path, &current.text)?;
        log::debug!("Autosaved {}", current.path.display());
        Ok(Some(current.path.clone()))
    }

    /// Panels for the open note, recomputed now.
    pub fn view(&self) -> Result<NoteView> {
        let current = self.current.as_ref().ok_or(VaultError::NoOpenNote)?;
        Ok(NoteView {
            path: current.path.clone(),
            name: current.name.clone(),
            text: current.text.clone(),
            preview: Preview::of(&current.text),
            backlinks: self.vault.backlinks_of(&current.name),
        })
    }

    pub fn rename(&mut self, path: &Path, new_name: &str) -> Result<MoveResult> {
        self.autosave()?;
        let result = self.vault.rename(path, new_name)?;
        self.follow_move(&result)?;
        Ok(result)
    }

    pub fn move_item(&mut self, path: &Path, dest_dir: &Path) -> Result<MoveResult> {
        self.autosave()?;
        let result = self.vault.move_item(path, dest_dir)?;
        self.follow_move(&result)?;
        Ok(result)
    }

    pub fn delete(&mut self, path: &Path) -> Result<PathBuf> {
        let path = self.vault.vault_path(path)?;
        self.vault.delete(&path)?;
        if self.current.as_ref().is_some_and(|c| c.path == path) {
            log::info!("Closed deleted note {}", path.display());
            self.current = None;
        }
        Ok(path)
    }

    /// Keeps the open note pointing at its file after a rename or move, and
    /// reloads it if the link rewrite touched it.
    fn follow_move(&mut self, result: &MoveResult) -> Result<()> {
        let Some(current) = self.current.as_mut() else {
            return Ok(());
        };
        let Ok(rest) = current.path.strip_prefix(&result.old_path) else {
            if result.links.rewritten.contains(&current.path) {
                current.text = self.vault.read_note(&current.path)?;
            }
            return Ok(());
        };
        let moved = if rest.as_os_str().is_empty() {
            result.new_path.clone()
        } else {
            result.new_path.join(rest)
        };
        if let Some(name) = note_name(&moved) {
            current.name = name;
        }
        current.path = moved;
        if result.links.rewritten.contains(&result.old_path) {
            current.text = self.vault.read_note(&current.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VaultConfig;
    use std::fs;
    use tempfile::TempDir;

    fn session(files: &[(&str, &str)]) -> (TempDir, Session) {
        let dir = TempDir::new().unwrap();
        for (rel, text) in files {
            let path = dir.path().join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, text).unwrap();
        }
        let vault = Vault::open(dir.path(), VaultConfig::default()).unwrap();
        (dir, Session::new(vault))
    }

    fn root(s: &Session) -> PathBuf {
        s.vault().root().to_path_buf()
    }

    #[test]
    fn test_edit_without_open_note_fails() {
        let (_dir, mut s) = session(&[]);
        let err = s.dispatch(Command::Edit("x".into())).unwrap_err();
        assert!(matches!(err, VaultError::NoOpenNote));
    }

    #[test]
    fn test_autosave_without_open_note_is_ignored() {
        let (_dir, mut s) = session(&[]);
        assert_eq!(s.dispatch(Command::AutosaveTick).unwrap(), Outcome::Ignored);
    }

    #[test]
    fn test_edit_updates_panels_but_not_disk_until_tick() {
        let (_dir, mut s) = session(&[("a.md", "old")]);
        let a = root(&s).join("a.md");
        s.open_note(&a).unwrap();

        let preview = s.edit("new #tag [[b]]".into()).unwrap();
        assert_eq!(preview.tags, vec!["tag"]);
        assert_eq!(preview.links.len(), 1);
        assert_eq!(fs::read_to_string(&a).unwrap(), "old");

        assert_eq!(s.dispatch(Command::AutosaveTick).unwrap(), Outcome::Saved(a.clone()));
        assert_eq!(fs::read_to_string(&a).unwrap(), "new #tag [[b]]");
    }

    #[test]
    fn test_autosave_writes_even_when_unchanged() {
        let (_dir, mut s) = session(&[("a.md", "same")]);
        let a = root(&s).join("a.md");
        s.open_note(&a).unwrap();
        fs::write(&a, "changed outside").unwrap();
        s.autosave().unwrap();
        assert_eq!(fs::read_to_string(&a).unwrap(), "same");
    }

    #[test]
    fn test_activate_dangling_link_is_noop() {
        let (_dir, mut s) = session(&[("a.md", "[[ghost]]")]);
        let a = root(&s).join("a.md");
        s.open_note(&a).unwrap();
        let out = s.dispatch(Command::ActivateLink("ghost".into())).unwrap();
        assert_eq!(out, Outcome::Ignored);
        assert_eq!(s.current().unwrap().path, a);
    }

    #[test]
    fn test_navigate_href_opens_target_and_saves_previous() {
        let (_dir, mut s) = session(&[("a.md", "[[My Note]]"), ("sub/My Note.md", "hi")]);
        let a = root(&s).join("a.md");
        s.open_note(&a).unwrap();
        s.edit("[[My Note]] edited".into()).unwrap();

        let out = s.dispatch(Command::Navigate("note:My%20Note".into())).unwrap();
        let Outcome::Opened(view) = out else {
            panic!("expected a note to open, got {out:?}");
        };
        assert_eq!(view.name, "My Note");
        assert_eq!(view.text, "hi");
        assert_eq!(view.backlinks.len(), 1);
        assert_eq!(view.backlinks[0].name, "a");
        assert_eq!(fs::read_to_string(&a).unwrap(), "[[My Note]] edited");
    }

    #[test]
    fn test_self_link_keeps_unsaved_edits() {
        let (_dir, mut s) = session(&[("a.md", "[[a]]")]);
        let a = root(&s).join("a.md");
        s.open_note(&a).unwrap();
        s.edit("[[a]] typed but unsaved".into()).unwrap();

        let out = s.dispatch(Command::ActivateLink("a".into())).unwrap();
        let Outcome::Opened(view) = out else {
            panic!("expected the note to stay open, got {out:?}");
        };
        assert_eq!(view.text, "[[a]] typed but unsaved");
        assert_eq!(s.current().unwrap().text, "[[a]] typed but unsaved");
        assert_eq!(fs::read_to_string(&a).unwrap(), "[[a]]");
    }

    #[test]
    fn test_foreign_href_is_ignored() {
        let (_dir, mut s) = session(&[]);
        let out = s.dispatch(Command::Navigate("https://example.com".into())).unwrap();
        assert_eq!(out, Outcome::Ignored);
    }

    #[test]
    fn test_rename_open_note_follows_it() {
        let (_dir, mut s) = session(&[("old.md", "self [[old]]"), ("ref.md", "[[old]]")]);
        let old = root(&s).join("old.md");
        s.open_note(&old).unwrap();

        s.dispatch(Command::Rename {
            path: old.clone(),
            new_name: "new".into(),
        })
        .unwrap();

        let current = s.current().unwrap();
        assert_eq!(current.path, root(&s).join("new.md"));
        assert_eq!(current.name, "new");
        assert_eq!(current.text, "self [[new]]");

        // The next tick must not resurrect the old link text.
        s.autosave().unwrap();
        assert_eq!(fs::read_to_string(root(&s).join("new.md")).unwrap(), "self [[new]]");
    }

    #[test]
    fn test_rename_other_note_reloads_rewritten_open_note() {
        let (_dir, mut s) = session(&[("old.md", ""), ("ref.md", "[[old]]")]);
        let r = root(&s).join("ref.md");
        s.open_note(&r).unwrap();
        s.edit("[[old]] plus unsaved".into()).unwrap();

        s.rename(&root(&s).join("old.md"), "new").unwrap();
        assert_eq!(s.current().unwrap().text, "[[new]] plus unsaved");
    }

    #[test]
    fn test_move_folder_containing_open_note() {
        let (_dir, mut s) = session(&[("A/n.md", "x"), ("B/keep.md", "")]);
        let n = root(&s).join("A/n.md");
        s.open_note(&n).unwrap();
        s.move_item(&root(&s).join("A"), &root(&s).join("B")).unwrap();
        assert_eq!(s.current().unwrap().path, root(&s).join("B/A/n.md"));
    }

    #[test]
    fn test_delete_open_note_closes_it() {
        let (_dir, mut s) = session(&[("a.md", "")]);
        let a = root(&s).join("a.md");
        s.open_note(&a).unwrap();
        assert_eq!(s.dispatch(Command::Delete(a.clone())).unwrap(), Outcome::Deleted(a));
        assert!(s.current().is_none());
    }

    #[test]
    fn test_new_note_and_refresh() {
        let (_dir, mut s) = session(&[]);
        let Outcome::Created(path) = s.dispatch(Command::NewNote { dir: None }).unwrap() else {
            panic!("expected a created note");
        };
        let Outcome::Tree(tree) = s.dispatch(Command::Refresh).unwrap() else {
            panic!("expected a tree");
        };
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].path, path);
    }
}
