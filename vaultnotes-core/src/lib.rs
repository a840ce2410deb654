//! Core library for Vaultnotes, a local-first markdown vault with wikilinks,
//! tags and backlinks.
//!
//! The primary entry points are [`Vault`], which represents an open vault
//! directory, and [`Session`], which holds the one open note and turns host
//! events into vault operations. Notes are plain `.md` files; every tag, link
//! and backlink is recomputed from file contents when asked for.
//!
//! Types are re-exported from their respective sub-modules for convenience;
//! consumers should import from the crate root rather than the `core` module.

pub mod core;

// Re-export commonly used types.
#[doc(inline)]
pub use self::core::{
    backlinks::{backlinks_of, references},
    error::{Result, VaultError},
    links::{find_links, link_href, render_with_links, target_from_href, Link, LINK_SCHEME},
    note::{note_name, NoteRef},
    rename::{propagate_rename, rewrite_literal, FailedRewrite, RenameReport},
    render::{render_markdown_to_html, render_preview},
    resolver::{duplicate_names, resolve},
    session::{Command, NoteView, OpenNote, Outcome, Preview, Session},
    settings::{
        load_settings, load_settings_from, save_settings, save_settings_to, settings_file_path,
        LinkMatching, Settings, VaultConfig, DEFAULT_AUTOSAVE_SECS,
    },
    storage::{is_markdown, Storage, MARKDOWN_EXTENSION},
    tags::extract_tags,
    tree::{build_tree, VaultIndex, VaultNode},
    vault::{new_note_file_name, MoveResult, Vault},
};
