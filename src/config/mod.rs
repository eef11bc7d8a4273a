// src/config/mod.rs

//! Configuration loading and validation for procguard.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate sinks, durations and env entries (`validate.rs`).
//! - Merge config with CLI flags into `RunSettings` (`settings.rs`).

pub mod loader;
pub mod model;
pub mod settings;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_optional};
pub use model::{ConfigFile, RawConfigFile, RawRunSection, RunSection};
pub use settings::RunSettings;
