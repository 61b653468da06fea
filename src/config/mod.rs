// src/config/mod.rs

//! Configuration loading and validation for cmdrunner.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the definition store (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate each command definition, skipping unusable ones (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve_config_path};
pub use model::{
    CommandDefinition, ConfigFile, DefinitionStore, GeneralSection, RawCommand, RawConfigFile,
    Settings,
};
pub use validate::{resolve_settings, validate_definition};
