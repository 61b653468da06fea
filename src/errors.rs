// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Failures inside the asynchronous pipeline (spawn errors, non-zero exits,
//! unreadable result files) are logged where they happen and never reach a
//! caller; this type covers the synchronous edges: loading definitions,
//! resolving a query, and building a plan for `--dry-run`.

use thiserror::Error;

use crate::script::BuildError;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Command definition not found: {0}")]
    DefinitionNotFound(String),

    #[error("No command definition matches query: {0:?}")]
    NoMatch(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Failed to build execution plan: {0}")]
    Build(#[from] BuildError),
}

pub type Result<T> = std::result::Result<T, RunnerError>;
