//! Storage configuration
//!
//! Holds the root directory for every catalog, the editor flag, the active
//! platform/feature flags and the passphrase for packaged-data encryption.
//! Configs can be built in code (`StoreConfig::for_app`) or loaded from a
//! JSON file, where any missing field takes its default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::storage::Catalog;

/// Environment variable forcing editor mode (plain-text packaged data)
pub const EDITOR_ENV: &str = "GAMEVAULT_EDITOR";

const DEFAULT_APP_NAME: &str = "gamevault";
const DEFAULT_PASSPHRASE: &str = "gamevault-default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Writable per-user directory (saves, settings, caches)
    pub persistent_root: PathBuf,
    /// Packaged read-only content shipped with the build
    pub streaming_root: PathBuf,
    /// Project files only touched by tooling
    pub project_root: PathBuf,
    /// Running inside the editor or another dev tool
    pub editor: bool,
    /// Active platform and feature flags for availability expressions
    pub platforms: Vec<String>,
    /// Passphrase the default encryption key is derived from
    pub passphrase: String,
}

impl StoreConfig {
    /// Default layout for an application
    ///
    /// Persistent data goes under the user's data directory, falling back to
    /// a local folder when the platform has none.
    pub fn for_app(app_name: &str) -> Self {
        let persistent_root = dirs::data_dir()
            .map(|p| p.join(app_name))
            .unwrap_or_else(|| PathBuf::from(format!("./{}", app_name)));

        StoreConfig {
            persistent_root,
            streaming_root: PathBuf::from("./StreamingAssets"),
            project_root: PathBuf::from("./Assets"),
            editor: editor_from_env(),
            platforms: vec![std::env::consts::OS.to_string()],
            passphrase: DEFAULT_PASSPHRASE.to_string(),
        }
    }

    /// Config with every catalog rooted under one directory
    ///
    /// Handy for tools and tests that want a self-contained tree.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        StoreConfig {
            persistent_root: root.join("persistent"),
            streaming_root: root.join("streaming"),
            project_root: root.join("project"),
            editor: false,
            platforms: Vec::new(),
            passphrase: DEFAULT_PASSPHRASE.to_string(),
        }
    }

    /// Loads a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let mut config: StoreConfig = serde_json::from_str(&text)
            .map_err(|e| StoreError::Config(format!("{}: {}", path.display(), e)))?;
        config.editor |= editor_from_env();
        Ok(config)
    }

    pub fn root(&self, catalog: Catalog) -> &Path {
        match catalog {
            Catalog::Persistent => &self.persistent_root,
            Catalog::Streaming => &self.streaming_root,
            Catalog::Project => &self.project_root,
        }
    }

    pub fn with_editor(mut self, editor: bool) -> Self {
        self.editor = editor;
        self
    }

    pub fn with_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = platforms.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = passphrase.into();
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::for_app(DEFAULT_APP_NAME)
    }
}

fn editor_from_env() -> bool {
    std::env::var(EDITOR_ENV)
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
