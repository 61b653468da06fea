// src/script/mod.rs

//! Script builder: turns a command definition plus the user's argument string
//! into an [`ExecutionPlan`].
//!
//! - [`quote`] holds the POSIX single-quote escaping used for every
//!   substituted value that reaches a shell.
//! - [`placeholders`] substitutes `{query}`, `{output_file}`, `{temp_script}`
//!   and `{install_dir}`.
//! - [`workdir`] resolves the child's working directory.
//! - [`builder`] decides between direct execution, `sh -c` and a generated
//!   script file, and writes that file when needed.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::CommandDefinition;
use crate::types::ExecutionMode;

pub mod builder;
pub mod placeholders;
pub mod quote;
pub mod workdir;

pub use builder::ScriptBuilder;
pub use quote::quote_for_shell;

/// Characters that make a template unsuitable for direct execution.
pub const SHELL_METACHARACTERS: &[char] = &['|', '>', '<', '&', ';', '`', '$', '*', '?', '[', '~'];

/// Characters that force a generated script file.
const SCRIPT_METACHARACTERS: &[char] = &['|', '>', ';'];

/// Marker inside `result_file` that ties the result file to the script.
pub const TEMP_SCRIPT_MARKER: &str = "%temp_script%";

/// How the child process is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// `program` is executed with `args`, no shell involved.
    Direct { program: String, args: Vec<String> },
    /// `command` is handed to `sh -c`.
    Shell { command: String },
    /// A generated script file, run through `sh` or inside a terminal.
    Script { path: PathBuf },
}

/// The concrete thing to run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub strategy: ExecutionStrategy,
    pub working_dir: PathBuf,
    pub result_file: Option<PathBuf>,
}

impl ExecutionPlan {
    pub fn needs_shell(&self) -> bool {
        !matches!(self.strategy, ExecutionStrategy::Direct { .. })
    }

    pub fn script_path(&self) -> Option<&Path> {
        match &self.strategy {
            ExecutionStrategy::Script { path } => Some(path),
            _ => None,
        }
    }
}

impl fmt::Display for ExecutionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.strategy {
            ExecutionStrategy::Direct { program, args } => {
                writeln!(f, "strategy: direct")?;
                writeln!(f, "program: {program}")?;
                writeln!(f, "args: {args:?}")?;
            }
            ExecutionStrategy::Shell { command } => {
                writeln!(f, "strategy: shell")?;
                writeln!(f, "command: {command}")?;
            }
            ExecutionStrategy::Script { path } => {
                writeln!(f, "strategy: script")?;
                writeln!(f, "script: {}", path.display())?;
            }
        }
        writeln!(f, "working_dir: {}", self.working_dir.display())?;
        match &self.result_file {
            Some(path) => write!(f, "result_file: {}", path.display()),
            None => write!(f, "result_file: none"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("command '{definition}' needs a temporary file path but none was supplied")]
    MissingTempPath { definition: String },

    #[error("failed to write script {path:?}: {source}")]
    ScriptWrite {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("command '{definition}' has an empty command template")]
    EmptyCommand { definition: String },
}

/// Which temporary artefacts an invocation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Requirements {
    pub script: bool,
    pub temp_path: bool,
}

/// Decide whether `definition` needs a generated script and a temp path.
pub fn requirements(definition: &CommandDefinition) -> Requirements {
    let has_result_file = definition.result_file_template.is_some();
    let script = definition.execution_mode == ExecutionMode::Terminal
        || definition.command_template.contains(SCRIPT_METACHARACTERS)
        || definition
            .result_file_template
            .as_deref()
            .is_some_and(|t| t.contains(TEMP_SCRIPT_MARKER));

    Requirements {
        script,
        temp_path: script || has_result_file,
    }
}

/// `<temp>.result`, the file a command writes its result into.
pub fn result_file_path(temp_path: &Path) -> PathBuf {
    let mut os: OsString = temp_path.as_os_str().to_owned();
    os.push(".result");
    PathBuf::from(os)
}
