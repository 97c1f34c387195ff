//! # Core Engine Module
//!
//! Project-level configuration shared by the engine and the binaries that
//! drive it.
//!
//! ## Organization
//!
//! - **Config**: the project manifest and its discovery rules

pub mod config;

pub use config::{Config, ConfigError, ProjectManifest, MANIFEST_FILE_NAMES};
