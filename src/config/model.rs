// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::types::{DefaultAction, ExecutionMode, ResultType, WorkingDirMode};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [general]
/// terminal = "konsole"
///
/// [command.find_file]
/// trigger_words = ["ff"]
/// command = "find . -name {query}"
/// result_type = "plaintext"
/// default_action = "copytoclipboard"
///
/// [command.find_file.actions]
/// code = "OpenFileWithVSCode"
/// ```
///
/// Command tables are kept as raw TOML values so that one malformed
/// definition can be skipped without rejecting the whole file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub general: GeneralSection,

    /// All commands from `[command.<id>]`, in file order.
    #[serde(default)]
    pub command: IndexMap<String, toml::Value>,
}

/// `[general]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralSection {
    /// Terminal emulator used for `execution_mode = "terminal"`.
    pub terminal: Option<String>,
    /// Explicit terminal argument list; `{script}` marks the script path.
    pub terminal_args: Option<Vec<String>>,
    /// Value substituted for `{install_dir}`.
    pub install_dir: Option<String>,
    /// Directory for generated scripts and result files.
    pub temp_dir: Option<String>,
}

/// One `[command.<id>]` table before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCommand {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,

    #[serde(default)]
    pub trigger_words: Vec<String>,

    #[serde(default)]
    pub command: String,

    #[serde(default)]
    pub execution_mode: ExecutionMode,

    pub working_directory_mode: Option<WorkingDirMode>,

    /// Legacy shorthand: `~`, `.`, `%query_or_home%` or a path.
    pub working_directory: Option<String>,

    pub explicit_working_dir: Option<String>,

    #[serde(default)]
    pub result_type: ResultType,

    pub result_file: Option<String>,

    #[serde(default)]
    pub default_action: DefaultAction,

    /// Action suffix -> action identifier or custom command template.
    #[serde(default)]
    pub actions: BTreeMap<String, String>,
}

/// A validated command definition. Read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDefinition {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub description: String,
    pub trigger_words: Vec<String>,
    pub command_template: String,
    pub execution_mode: ExecutionMode,
    pub working_dir_mode: WorkingDirMode,
    pub explicit_working_dir: Option<String>,
    pub result_type: ResultType,
    pub result_file_template: Option<String>,
    pub default_action: DefaultAction,
    pub actions: BTreeMap<String, String>,
}

impl CommandDefinition {
    /// Minimal definition with every optional field at its default.
    pub fn new(
        id: impl Into<String>,
        trigger_words: Vec<String>,
        command_template: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            icon: DEFAULT_ICON.to_string(),
            description: String::new(),
            trigger_words,
            command_template: command_template.into(),
            execution_mode: ExecutionMode::default(),
            working_dir_mode: WorkingDirMode::default(),
            explicit_working_dir: None,
            result_type: ResultType::default(),
            result_file_template: None,
            default_action: DefaultAction::default(),
            actions: BTreeMap::new(),
        }
    }

    /// A definition is usable only with an id and at least one trigger.
    pub fn is_valid(&self) -> bool {
        !self.id.is_empty() && !self.trigger_words.is_empty()
    }

    /// Whether stdout should be collected for the result.
    pub fn captures_stdout(&self) -> bool {
        self.execution_mode == ExecutionMode::Background
            && self.result_file_template.is_none()
            && self.result_type != ResultType::None
    }
}

pub const DEFAULT_ICON: &str = "system-run";
pub const DEFAULT_TERMINAL: &str = "konsole";

/// Resolved `[general]` settings, passed explicitly to the supervisor and
/// the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub terminal: String,
    pub terminal_args: Option<Vec<String>>,
    pub install_dir: PathBuf,
    pub temp_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            terminal: DEFAULT_TERMINAL.to_string(),
            terminal_args: None,
            install_dir: default_install_dir(),
            temp_dir: std::env::temp_dir(),
        }
    }
}

fn default_install_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("cmdrunner"))
        .unwrap_or_else(|| PathBuf::from("/usr/share/cmdrunner"))
}

/// Ordered collection of command definitions with lookup by id.
#[derive(Debug, Clone, Default)]
pub struct DefinitionStore {
    definitions: Vec<Arc<CommandDefinition>>,
}

impl DefinitionStore {
    pub fn new(definitions: Vec<CommandDefinition>) -> Self {
        Self {
            definitions: definitions.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn definitions(&self) -> &[Arc<CommandDefinition>] {
        &self.definitions
    }

    pub fn get(&self, id: &str) -> Option<Arc<CommandDefinition>> {
        self.definitions.iter().find(|d| d.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Validated configuration: settings plus the definition store.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub settings: Settings,
    pub store: DefinitionStore,
}
