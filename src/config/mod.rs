// src/config/mod.rs

//! Optional TOML configuration.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate value ranges and log levels (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    DEFAULT_CONFIG_FILE, default_config_path, load_and_validate, load_from_path, load_or_default,
    resolve_config_path,
};
pub use model::{ConfigFile, DemoSection, EngineSection, LoggingSection, RawConfigFile};
