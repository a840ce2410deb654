//! `vaultnotes`: command-line host for a Vaultnotes vault.
//!
//! Each invocation opens the vault, runs one command through a
//! [`Session`], prints the outcome and exits. Paths are taken relative to
//! the vault root unless absolute.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use vaultnotes_core::{
    load_settings, save_settings, settings_file_path, Command, NoteRef, Outcome, Result, Session,
    Settings, Vault, VaultError, VaultNode,
};

#[derive(Debug, Parser)]
#[command(
    name = "vaultnotes",
    version,
    about = "Browse, link and reorganise a markdown vault"
)]
struct Cli {
    /// Vault directory. Defaults to the last vault used.
    #[arg(long, global = true)]
    vault: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Show the folder and note tree.
    Tree,
    /// Open a note and show its tags, links and backlinks.
    Open { path: PathBuf },
    /// Tags in a note.
    Tags { path: PathBuf },
    /// Wikilinks in a note.
    Links { path: PathBuf },
    /// Notes linking to the note with this name.
    Backlinks { name: String },
    /// Path of the note with this name.
    Resolve { name: String },
    /// Rendered HTML preview of a note.
    Preview { path: PathBuf },
    /// Replace a note's text with stdin, as the editor plus one autosave tick would.
    Write { path: PathBuf },
    /// Follow a wikilink from the preview (`note:...` href or a bare name).
    Follow { link: String },
    /// Create a new empty note.
    New { dir: Option<PathBuf> },
    /// Create a folder.
    Mkdir {
        name: String,
        #[arg(long)]
        parent: Option<PathBuf>,
    },
    /// Rename a note or folder, rewriting links to a renamed note.
    Rename { path: PathBuf, new_name: String },
    /// Move a note or folder into another folder.
    Move { path: PathBuf, dest_dir: PathBuf },
    /// Delete a note or an empty folder.
    Delete { path: PathBuf },
    /// Note names used by more than one file.
    Duplicates,
    /// Show the settings file location and contents.
    Config,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::debug!("{e:?}");
            eprintln!("Error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut settings = load_settings();
    if let Cmd::Config = cli.command {
        return show_config(&settings, cli.json);
    }

    let root = cli
        .vault
        .clone()
        .or_else(|| settings.last_vault.clone())
        .ok_or_else(|| VaultError::InvalidVault("no vault given; pass --vault <dir>".into()))?;
    let vault = Vault::open(&root, settings.vault_config())?;
    remember_vault(&mut settings, vault.root());

    let mut session = Session::new(vault);
    execute(&mut session, cli.command, cli.json)
}

/// Runs one subcommand against an opened vault and prints the result.
fn execute(session: &mut Session, command: Cmd, json: bool) -> Result<()> {
    match command {
        Cmd::Tree => {
            let tree = session.vault_mut().tree()?;
            emit(json, tree, || print_tree(tree, 0))
        }
        Cmd::Open { path } => {
            let view = session.open_note(&path)?;
            emit(json, &view, || {
                println!("{} ({})", view.name, view.path.display());
                println!("tags: {}", view.preview.tags.join(", "));
                for link in &view.preview.links {
                    println!("link: {} -> {}", link.label, link.target);
                }
                print_refs("backlink", &view.backlinks);
            })
        }
        Cmd::Tags { path } => {
            let view = session.open_note(&path)?;
            emit(json, &view.preview.tags, || {
                view.preview.tags.iter().for_each(|t| println!("#{t}"))
            })
        }
        Cmd::Links { path } => {
            let view = session.open_note(&path)?;
            emit(json, &view.preview.links, || {
                for link in &view.preview.links {
                    println!("{}\t{}", link.target, link.label);
                }
            })
        }
        Cmd::Backlinks { name } => {
            let refs = session.vault().backlinks_of(&name);
            emit(json, &refs, || print_refs("", &refs))
        }
        Cmd::Resolve { name } => match session.vault().resolve(&name) {
            Some(note) => emit(json, &note, || println!("{}", note.path.display())),
            None => Err(VaultError::NoteNotFound(PathBuf::from(name))),
        },
        Cmd::Preview { path } => {
            let view = session.open_note(&path)?;
            emit(json, &view.preview.html, || print!("{}", view.preview.html))
        }
        Cmd::Write { path } => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            session.dispatch(Command::OpenNote(path))?;
            session.dispatch(Command::Edit(text))?;
            report(json, session.dispatch(Command::AutosaveTick)?)
        }
        Cmd::Follow { link } => {
            let command = if link.starts_with(vaultnotes_core::LINK_SCHEME) {
                Command::Navigate(link)
            } else {
                Command::ActivateLink(link)
            };
            report(json, session.dispatch(command)?)
        }
        Cmd::New { dir } => report(json, session.dispatch(Command::NewNote { dir })?),
        Cmd::Mkdir { name, parent } => {
            report(json, session.dispatch(Command::NewFolder { parent, name })?)
        }
        Cmd::Rename { path, new_name } => {
            report(json, session.dispatch(Command::Rename { path, new_name })?)
        }
        Cmd::Move { path, dest_dir } => {
            report(json, session.dispatch(Command::Move { path, dest_dir })?)
        }
        Cmd::Delete { path } => report(json, session.dispatch(Command::Delete(path))?),
        Cmd::Duplicates => {
            let dups = session.vault().duplicate_names();
            emit(json, &dups, || {
                for (name, paths) in &dups {
                    println!("{name}");
                    paths.iter().for_each(|p| println!("  {}", p.display()));
                }
            })
        }
        Cmd::Config => show_config(&load_settings(), json),
    }
}

fn remember_vault(settings: &mut Settings, root: &Path) {
    if settings.last_vault.as_deref() == Some(root) {
        return;
    }
    settings.last_vault = Some(root.to_path_buf());
    if let Err(e) = save_settings(settings) {
        log::warn!("Could not remember vault: {e}");
    }
}

fn show_config(settings: &Settings, json: bool) -> Result<()> {
    emit(json, settings, || {
        println!("settings file: {}", settings_file_path().display());
        match &settings.last_vault {
            Some(p) => println!("last vault: {}", p.display()),
            None => println!("last vault: (none)"),
        }
        println!("autosave every: {:?}", settings.autosave_interval());
        println!("link matching: {:?}", settings.link_matching);
    })
}

/// Prints `value` as pretty JSON, or runs `human` for plain output.
fn emit<T: Serialize + ?Sized>(json: bool, value: &T, human: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human();
    }
    Ok(())
}

fn report(json: bool, outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Opened(view) => emit(json, &view, || {
            println!("opened {} ({})", view.name, view.path.display())
        }),
        Outcome::Previewed(preview) => emit(json, &preview, || print!("{}", preview.html)),
        Outcome::Saved(path) => emit(json, &path, || println!("saved {}", path.display())),
        Outcome::Created(path) => emit(json, &path, || println!("created {}", path.display())),
        Outcome::Deleted(path) => emit(json, &path, || println!("deleted {}", path.display())),
        Outcome::Moved(result) => emit(json, &result, || {
            println!(
                "moved {} -> {}",
                result.old_path.display(),
                result.new_path.display()
            );
            result
                .links
                .rewritten
                .iter()
                .for_each(|p| println!("  updated links in {}", p.display()));
            for failed in &result.links.failed {
                eprintln!("  could not update {}: {}", failed.path.display(), failed.error);
            }
        }),
        Outcome::Tree(tree) => emit(json, &tree, || print_tree(&tree, 0)),
        Outcome::Ignored => emit(json, &serde_json::Value::Null, || {
            println!("nothing to do")
        }),
    }
}

fn print_tree(node: &VaultNode, depth: usize) {
    let marker = if node.is_dir { "/" } else { "" };
    println!("{}{}{marker}", "  ".repeat(depth), node.name);
    for child in &node.children {
        print_tree(child, depth + 1);
    }
}

fn print_refs(prefix: &str, refs: &[NoteRef]) {
    for r in refs {
        if prefix.is_empty() {
            println!("{}\t{}", r.name, r.path.display());
        } else {
            println!("{prefix}: {} ({})", r.name, r.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["vaultnotes", "backlinks", "Home", "--json", "--vault", "/v"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.vault, Some(PathBuf::from("/v")));
        assert!(matches!(cli.command, Cmd::Backlinks { ref name } if name == "Home"));
    }

    #[test]
    fn test_rename_command_rewrites_links() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("old.md"), "").unwrap();
        std::fs::write(dir.path().join("ref.md"), "See [[old]]").unwrap();
        let vault = Vault::open(dir.path(), Default::default()).unwrap();
        let mut session = Session::new(vault);

        let cli = Cli::try_parse_from(["vaultnotes", "rename", "old.md", "new"]).unwrap();
        execute(&mut session, cli.command, true).unwrap();

        assert!(dir.path().join("new.md").exists());
        assert!(!dir.path().join("old.md").exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("ref.md")).unwrap(),
            "See [[new]]"
        );
        let backlinks = session.vault().backlinks_of("new");
        assert_eq!(backlinks.len(), 1);
        assert_eq!(backlinks[0].name, "ref");
    }

    #[test]
    fn test_resolve_command_reports_missing_note() {
        let dir = tempfile::TempDir::new().unwrap();
        let vault = Vault::open(dir.path(), Default::default()).unwrap();
        let mut session = Session::new(vault);

        let cli = Cli::try_parse_from(["vaultnotes", "resolve", "ghost"]).unwrap();
        let err = execute(&mut session, cli.command, false).unwrap_err();
        assert!(matches!(err, VaultError::NoteNotFound(_)));
    }

    #[test]
    fn test_mkdir_parent_flag() {
        let cli = Cli::try_parse_from(["vaultnotes", "mkdir", "Ideas", "--parent", "Projects"]).unwrap();
        match cli.command {
            Cmd::Mkdir { name, parent } => {
                assert_eq!(name, "Ideas");
                assert_eq!(parent, Some(PathBuf::from("Projects")));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
