// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Environment variable that overrides the default config location.
pub const CONFIG_ENV_VAR: &str = "CMDRUNNER_CONFIG";

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization of the outer structure; individual
/// command tables are validated by [`load_and_validate`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents)
}

/// Parse TOML text into a `RawConfigFile`.
pub fn parse_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate every definition.
///
/// Invalid definitions are skipped with a warning; a file without any valid
/// definition is an error.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?;
    info!(
        path = %path.display(),
        definitions = config.store.len(),
        "loaded command definitions"
    );
    Ok(config)
}

/// Resolve the config path: explicit argument, then `CMDRUNNER_CONFIG`, then
/// `~/.config/cmdrunner/commands.toml`.
pub fn resolve_config_path(explicit: Option<&str>) -> PathBuf {
    let chosen = explicit
        .map(str::to_string)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().filter(|v| !v.is_empty()));

    match chosen {
        Some(path) => PathBuf::from(shellexpand::tilde(&path).into_owned()),
        None => default_config_path(),
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cmdrunner")
        .join("commands.toml")
}
