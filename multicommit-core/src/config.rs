//! Settings file and per-batch context.
//!
//! # Storage layout
//!
//! ```text
//! ~/.multicommit/
//!   config.yaml     (optional, read-only for multicommit)
//! ```
//!
//! As with the rest of the crate, `load_at(home)` takes an explicit home and
//! `load()` derives it from `dirs::home_dir()`. Tests only call `load_at`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Placeholder replaced by the project-relative target path.
pub const PATH_PLACEHOLDER: &str = "{path}";

fn default_remote() -> String {
    "origin".to_string()
}

fn default_commit_message() -> String {
    format!("Automatic update: {PATH_PLACEHOLDER}")
}

fn default_author_name() -> String {
    "multicommit".to_string()
}

fn default_author_email() -> String {
    "multicommit@localhost".to_string()
}

fn default_push() -> bool {
    true
}

/// Knobs read from `config.yaml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Remote that publish pushes to.
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Commit message template; must contain `{path}`.
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
    /// Signature used when the repository's git config has no identity.
    #[serde(default = "default_author_name")]
    pub author_name: String,
    #[serde(default = "default_author_email")]
    pub author_email: String,
    /// When false, publish stops after the local commit.
    #[serde(default = "default_push")]
    pub push: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote: default_remote(),
            commit_message: default_commit_message(),
            author_name: default_author_name(),
            author_email: default_author_email(),
            push: default_push(),
        }
    }
}

impl Settings {
    /// Deterministic commit message for `relative_path`. Always uses `/` as
    /// separator so every project gets the same message.
    pub fn commit_message_for(&self, relative_path: &Path) -> String {
        let path = relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        self.commit_message.replace(PATH_PLACEHOLDER, &path)
    }

    fn validate(self) -> Result<Self, SettingsError> {
        if !self.commit_message.contains(PATH_PLACEHOLDER) {
            return Err(SettingsError::InvalidTemplate {
                template: self.commit_message,
            });
        }
        Ok(self)
    }
}

/// `<home>/.multicommit/config.yaml`: pure, no I/O.
pub fn settings_path_at(home: &Path) -> PathBuf {
    home.join(".multicommit").join("config.yaml")
}

/// Load settings; a missing file yields [`Settings::default`].
pub fn load_at(home: &Path) -> Result<Settings, SettingsError> {
    let path = settings_path_at(home);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    let settings: Settings =
        serde_yaml::from_str(&contents).map_err(|e| SettingsError::Parse { path, source: e })?;
    settings.validate()
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Settings, SettingsError> {
    let home = dirs::home_dir().ok_or(SettingsError::HomeNotFound)?;
    load_at(&home)
}

/// Everything one batch run needs, passed explicitly into each stage.
#[derive(Debug, Clone)]
pub struct BatchContext {
    /// Directory whose immediate subdirectories are the projects.
    pub projects_dir: PathBuf,
    /// File whose content is distributed.
    pub update_file: PathBuf,
    /// Absolute path of the file to replace, inside one of the projects.
    pub target_file: PathBuf,
    /// Copy only; publish is refused.
    pub debug_mode: bool,
    pub settings: Settings,
}

impl BatchContext {
    pub fn new(projects_dir: PathBuf, update_file: PathBuf, target_file: PathBuf) -> Self {
        Self {
            projects_dir,
            update_file,
            target_file,
            debug_mode: false,
            settings: Settings::default(),
        }
    }

    pub fn with_debug_mode(mut self, debug_mode: bool) -> Self {
        self.debug_mode = debug_mode;
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }
}
