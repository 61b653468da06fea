#![allow(dead_code)]

use std::path::PathBuf;

use cmdrunner::config::{CommandDefinition, ConfigFile, DefinitionStore, Settings};
use cmdrunner::types::{DefaultAction, ExecutionMode, ResultType, WorkingDirMode};

/// Builder for `CommandDefinition`.
pub struct DefinitionBuilder {
    def: CommandDefinition,
}

impl DefinitionBuilder {
    pub fn new(id: &str, trigger: &str, template: &str) -> Self {
        Self {
            def: CommandDefinition::new(id, vec![trigger.to_string()], template),
        }
    }

    pub fn trigger(mut self, trigger: &str) -> Self {
        self.def.trigger_words.push(trigger.to_string());
        self
    }

    pub fn terminal(mut self) -> Self {
        self.def.execution_mode = ExecutionMode::Terminal;
        self
    }

    pub fn working_dir(mut self, mode: WorkingDirMode) -> Self {
        self.def.working_dir_mode = mode;
        self
    }

    pub fn explicit_dir(mut self, path: &str) -> Self {
        self.def.working_dir_mode = WorkingDirMode::ExplicitPath;
        self.def.explicit_working_dir = Some(path.to_string());
        self
    }

    pub fn result_type(mut self, result_type: ResultType) -> Self {
        self.def.result_type = result_type;
        self
    }

    pub fn result_file(mut self, template: &str) -> Self {
        self.def.result_file_template = Some(template.to_string());
        self
    }

    pub fn default_action(mut self, action: DefaultAction) -> Self {
        self.def.default_action = action;
        self
    }

    pub fn action(mut self, suffix: &str, identifier: &str) -> Self {
        self.def
            .actions
            .insert(suffix.to_string(), identifier.to_string());
        self
    }

    pub fn build(self) -> CommandDefinition {
        self.def
    }
}

/// Builder for a validated `ConfigFile`.
pub struct ConfigFileBuilder {
    settings: Settings,
    definitions: Vec<CommandDefinition>,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            definitions: Vec::new(),
        }
    }

    pub fn with_definition(mut self, def: CommandDefinition) -> Self {
        self.definitions.push(def);
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.temp_dir = dir.into();
        self
    }

    pub fn install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.install_dir = dir.into();
        self
    }

    pub fn terminal(mut self, terminal: &str, args: Option<Vec<String>>) -> Self {
        self.settings.terminal = terminal.to_string();
        self.settings.terminal_args = args;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile {
            settings: self.settings,
            store: DefinitionStore::new(self.definitions),
        }
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
