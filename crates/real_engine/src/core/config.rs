//! # Project Manifest
//!
//! Every project directory carries a manifest (`project.toml` or
//! `project.ron`) naming the project, its default scene and the settings
//! the engine loop and the logger start from.
//!
//! ```toml
//! name = "Demo"
//! version = "0.1.0"
//! default_scene = "main"
//! tps = 30
//! log_level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::foundation::logging::LoggingSettings;

pub use crate::config::{Config, ConfigError};

/// Manifest file names, in lookup order
pub const MANIFEST_FILE_NAMES: [&str; 2] = ["project.toml", "project.ron"];

/// # Project Manifest
///
/// Project metadata plus engine and logging settings. Every field except
/// `default_scene` has a default, so a minimal manifest is one line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectManifest {
    /// Project name
    pub name: String,
    /// Project version
    pub version: String,
    /// Free-form description
    pub description: String,
    /// Scene instantiated at startup
    pub default_scene: String,
    /// Fixed ticks per second
    pub tps: u32,
    /// Minimum log level name
    pub log_level: String,
    /// Log to the console when no log file is set
    pub console_logging: bool,
    /// Log file, relative to the project directory
    pub log_file: Option<PathBuf>,
    /// Folder searched for scenes referenced by name
    pub scenes_folder: PathBuf,
    /// Upper bound on tick passes per loop iteration
    pub max_ticks_per_iteration: u32,
    /// Optional cap on loop iterations per second
    pub target_fps: Option<u32>,
    /// Extension modules to load; all supplied modules when absent
    pub extensions: Option<Vec<String>>,
}

impl Default for ProjectManifest {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            version: "0.1.0".to_string(),
            description: String::new(),
            default_scene: String::new(),
            tps: 60,
            log_level: "debug".to_string(),
            console_logging: true,
            log_file: None,
            scenes_folder: PathBuf::from("Scenes"),
            max_ticks_per_iteration: 5,
            target_fps: None,
            extensions: None,
        }
    }
}

impl Config for ProjectManifest {}

impl ProjectManifest {
    /// Create a manifest for `name` starting at `default_scene`
    pub fn new(name: impl Into<String>, default_scene: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_scene: default_scene.into(),
            ..Default::default()
        }
    }

    /// Set the tick rate
    pub fn with_tps(mut self, tps: u32) -> Self {
        self.tps = tps;
        self
    }

    /// Set the scenes folder
    pub fn with_scenes_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.scenes_folder = folder.into();
        self
    }

    /// Set the per-iteration tick cap
    pub fn with_max_ticks_per_iteration(mut self, max: u32) -> Self {
        self.max_ticks_per_iteration = max;
        self
    }

    /// Restrict which extension modules are loaded
    pub fn with_extensions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Find the manifest file in `dir`
    pub fn locate(dir: impl AsRef<Path>) -> Option<PathBuf> {
        MANIFEST_FILE_NAMES
            .iter()
            .map(|file| dir.as_ref().join(file))
            .find(|path| path.is_file())
    }

    /// Load and validate the manifest from `dir`
    ///
    /// Returns `Ok(None)` when the directory holds no manifest.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Option<Self>, ConfigError> {
        let Some(path) = Self::locate(dir) else {
            return Ok(None);
        };

        log::debug!("Loading project manifest from {}", path.display());
        let manifest = Self::load_from_file(&path)?;
        manifest.validate()?;
        Ok(Some(manifest))
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tps == 0 {
            return Err(ConfigError::Invalid("tps must be greater than zero".to_string()));
        }
        if self.default_scene.trim().is_empty() {
            return Err(ConfigError::Invalid("default_scene must be set".to_string()));
        }
        if self.max_ticks_per_iteration == 0 {
            return Err(ConfigError::Invalid(
                "max_ticks_per_iteration must be greater than zero".to_string(),
            ));
        }
        if self.target_fps == Some(0) {
            return Err(ConfigError::Invalid("target_fps must be greater than zero".to_string()));
        }
        crate::foundation::logging::parse_level(&self.log_level)?;
        Ok(())
    }

    /// Logger settings with the log file resolved against `project_dir`
    pub fn logging_settings(&self, project_dir: impl AsRef<Path>) -> LoggingSettings {
        LoggingSettings {
            level: self.log_level.clone(),
            console: self.console_logging,
            file: self.log_file.as_ref().map(|file| project_dir.as_ref().join(file)),
        }
    }

    /// Whether the extension module `name` is allowed to load
    pub fn allows_extension(&self, name: &str) -> bool {
        self.extensions
            .as_ref()
            .map_or(true, |names| names.iter().any(|allowed| allowed == name))
    }
}
