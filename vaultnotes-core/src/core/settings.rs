//! Application settings persistence for Vaultnotes.
//!
//! Stores user preferences (last opened vault, autosave period, link
//! matching mode) in a JSON file at an OS-appropriate location.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::Result;

/// Autosave period used when the settings file does not set one.
pub const DEFAULT_AUTOSAVE_SECS: u64 = 5;

/// How backlink lookup and rename propagation recognise a reference to a note.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMatching {
    /// Literal `[[name]]` / `![[name]]` text. Labeled links such as
    /// `[[name|label]]` are not seen, and renames leave embeds untouched.
    #[default]
    Literal,
    /// Every parsed wikilink whose target is the note, whatever its label or
    /// embed marker. Renames keep the label and the `!`.
    Structural,
}

/// The part of the settings the vault operations depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VaultConfig {
    pub link_matching: LinkMatching,
}

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Vault opened most recently; used when no vault is given explicitly.
    pub last_vault: Option<PathBuf>,
    /// Seconds between autosave ticks.
    pub autosave_interval_secs: u64,
    pub link_matching: LinkMatching,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_vault: None,
            autosave_interval_secs: DEFAULT_AUTOSAVE_SECS,
            link_matching: LinkMatching::default(),
        }
    }
}

impl Settings {
    /// Autosave period; a zero setting falls back to the default.
    pub fn autosave_interval(&self) -> Duration {
        match self.autosave_interval_secs {
            0 => Duration::from_secs(DEFAULT_AUTOSAVE_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    pub fn vault_config(&self) -> VaultConfig {
        VaultConfig {
            link_matching: self.link_matching,
        }
    }
}

/// Returns the path to the settings JSON file.
///
/// - macOS / Linux: `~/.config/vaultnotes/settings.json`
/// - Windows: `%APPDATA%/Vaultnotes/settings.json`
pub fn settings_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("Vaultnotes").join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("vaultnotes").join("settings.json")
    }
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
pub fn load_settings_from(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt settings file {}: {e}", path.display());
            Settings::default()
        }),
        Err(_) => Settings::default(),
    }
}

/// Saves settings to `path`, creating parent directories as needed.
pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}

/// Loads settings from [`settings_file_path`].
pub fn load_settings() -> Settings {
    load_settings_from(&settings_file_path())
}

/// Saves settings to [`settings_file_path`].
pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_file_path(), settings)
}
