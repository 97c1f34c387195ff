//! Logging utilities
//!
//! Installs an `env_logger` backend configured from the project manifest.

use std::fs::OpenOptions;
use std::path::PathBuf;

use log::LevelFilter;

use crate::config::ConfigError;

pub use log::{debug, error, info, trace, warn};

/// Logger settings taken from the project manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Minimum level name, e.g. `debug` or `warning`
    pub level: String,
    /// Write to stderr when no log file is set
    pub console: bool,
    /// Append log records to this file instead of the console
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            console: true,
            file: None,
        }
    }
}

/// Map a manifest level name to a filter
///
/// `critical` has no counterpart in `log` and maps to `Error`.
pub fn parse_level(name: &str) -> Result<LevelFilter, ConfigError> {
    let filter = match name.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "information" | "info" => LevelFilter::Info,
        "warning" | "warn" => LevelFilter::Warn,
        "error" | "err" | "critical" | "crit" => LevelFilter::Error,
        "off" | "none" => LevelFilter::Off,
        other => return Err(ConfigError::Invalid(format!("unknown log level '{other}'"))),
    };
    Ok(filter)
}

/// Initialize the logging system
///
/// `RUST_LOG` still applies on top of the manifest level. Installing a second
/// logger in the same process fails with [`ConfigError::Logging`].
pub fn init(settings: &LoggingSettings) -> Result<(), ConfigError> {
    let mut level = parse_level(&settings.level)?;

    let mut builder = env_logger::Builder::new();
    builder.format_timestamp_millis();

    if let Some(path) = &settings.file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ConfigError::Logging(format!("cannot open {}: {e}", path.display())))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else if settings.console {
        builder.target(env_logger::Target::Stderr);
    } else {
        level = LevelFilter::Off;
    }

    builder.filter_level(level);
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    builder.try_init().map_err(|e| ConfigError::Logging(e.to_string()))?;
    log::info!("Logging initialized at level {level}");
    Ok(())
}
