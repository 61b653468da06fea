// src/config/validate.rs

use std::path::PathBuf;

use tracing::warn;

use crate::config::model::{
    CommandDefinition, ConfigFile, DefinitionStore, GeneralSection, RawCommand, RawConfigFile,
    Settings, DEFAULT_ICON, DEFAULT_TERMINAL,
};
use crate::errors::{Result, RunnerError};
use crate::types::{ExecutionMode, ResultType, WorkingDirMode};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RunnerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_commands(&raw)?;

        let settings = resolve_settings(&raw.general);
        let mut definitions = Vec::with_capacity(raw.command.len());

        for (id, value) in raw.command {
            let parsed = value
                .try_into::<RawCommand>()
                .map_err(|e| e.to_string())
                .and_then(|cmd| validate_definition(&id, cmd));

            match parsed {
                Ok(def) => definitions.push(def),
                Err(reason) => {
                    warn!(definition = %id, %reason, "skipping invalid command definition");
                }
            }
        }

        if definitions.is_empty() {
            return Err(RunnerError::ConfigError(
                "no valid [command.<id>] definitions found".to_string(),
            ));
        }

        Ok(ConfigFile {
            settings,
            store: DefinitionStore::new(definitions),
        })
    }
}

fn ensure_has_commands(cfg: &RawConfigFile) -> Result<()> {
    if cfg.command.is_empty() {
        return Err(RunnerError::ConfigError(
            "config must contain at least one [command.<id>] section".to_string(),
        ));
    }
    Ok(())
}

/// Resolve `[general]` into concrete settings, expanding `~` in paths.
pub fn resolve_settings(general: &GeneralSection) -> Settings {
    let defaults = Settings::default();

    let terminal = general
        .terminal
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TERMINAL)
        .to_string();

    Settings {
        terminal,
        terminal_args: general.terminal_args.clone(),
        install_dir: expand_dir(general.install_dir.as_deref()).unwrap_or(defaults.install_dir),
        temp_dir: expand_dir(general.temp_dir.as_deref()).unwrap_or(defaults.temp_dir),
    }
}

fn expand_dir(value: Option<&str>) -> Option<PathBuf> {
    let value = value.map(str::trim).filter(|v| !v.is_empty())?;
    Some(PathBuf::from(shellexpand::tilde(value).into_owned()))
}

/// Turn one raw command table into a definition, or explain why it is
/// unusable.
pub fn validate_definition(
    id: &str,
    raw: RawCommand,
) -> std::result::Result<CommandDefinition, String> {
    if id.trim().is_empty() {
        return Err("command id must not be empty".to_string());
    }

    let trigger_words: Vec<String> = raw
        .trigger_words
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if trigger_words.is_empty() {
        return Err("trigger_words must contain at least one non-empty entry".to_string());
    }

    let command_template = raw.command.trim().to_string();
    if command_template.is_empty() {
        return Err("command must not be empty".to_string());
    }

    let result_file_template = raw
        .result_file
        .filter(|f| !f.trim().is_empty());

    if raw.execution_mode == ExecutionMode::Terminal
        && raw.result_type != ResultType::None
        && result_file_template.is_none()
    {
        return Err(
            "terminal commands cannot return stdout; declare result_file or use result_type = \"none\""
                .to_string(),
        );
    }

    let (working_dir_mode, explicit_working_dir) = resolve_working_dir(
        id,
        raw.working_directory_mode,
        raw.working_directory.as_deref(),
        raw.explicit_working_dir,
    );

    Ok(CommandDefinition {
        id: id.to_string(),
        name: raw.name.filter(|n| !n.is_empty()).unwrap_or_else(|| id.to_string()),
        icon: raw
            .icon
            .filter(|i| !i.is_empty())
            .unwrap_or_else(|| DEFAULT_ICON.to_string()),
        description: raw.description.unwrap_or_default(),
        trigger_words,
        command_template,
        execution_mode: raw.execution_mode,
        working_dir_mode,
        explicit_working_dir,
        result_type: raw.result_type,
        result_file_template,
        default_action: raw.default_action,
        actions: raw.actions,
    })
}

/// Pick the working-directory mode, honouring the legacy
/// `working_directory` shorthand when no explicit mode is given.
fn resolve_working_dir(
    id: &str,
    mode: Option<WorkingDirMode>,
    legacy: Option<&str>,
    explicit: Option<String>,
) -> (WorkingDirMode, Option<String>) {
    let explicit = explicit.filter(|p| !p.trim().is_empty());

    let (mode, explicit) = match (mode, legacy.map(str::trim)) {
        (Some(mode), _) => (mode, explicit),
        (None, Some("~")) => (WorkingDirMode::Home, explicit),
        (None, Some(".")) => (WorkingDirMode::Current, explicit),
        (None, Some("%query_or_home%")) => (WorkingDirMode::QueryOrHome, explicit),
        (None, Some("")) | (None, None) => (WorkingDirMode::default(), explicit),
        (None, Some(path)) => (WorkingDirMode::ExplicitPath, Some(path.to_string())),
    };

    if mode == WorkingDirMode::ExplicitPath && explicit.is_none() {
        warn!(
            definition = %id,
            "working_directory_mode is explicitpath but no explicit_working_dir is set; using home"
        );
        return (WorkingDirMode::Home, None);
    }

    (mode, explicit)
}
