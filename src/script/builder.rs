// src/script/builder.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::CommandDefinition;
use crate::fs::FileSystem;

use super::placeholders::{mask, Placeholders, Quoting};
use super::workdir::resolve_working_directory;
use super::{
    requirements, result_file_path, BuildError, ExecutionPlan, ExecutionStrategy,
    SHELL_METACHARACTERS,
};

/// Mode of a generated script: rwx for the owner, r-x for group and other.
pub const SCRIPT_MODE: u32 = 0o755;

/// Builds execution plans. Stateless apart from its filesystem handle and
/// the two directories it substitutes.
#[derive(Debug, Clone)]
pub struct ScriptBuilder {
    fs: Arc<dyn FileSystem>,
    home: PathBuf,
    install_dir: PathBuf,
}

impl ScriptBuilder {
    pub fn new(fs: Arc<dyn FileSystem>, home: PathBuf, install_dir: PathBuf) -> Self {
        Self {
            fs,
            home,
            install_dir,
        }
    }

    /// Turn `definition` plus `args` into a plan.
    ///
    /// `temp_path` is required when [`super::requirements`] says so; the
    /// script (if any) is written to exactly that path and the result file is
    /// `<temp_path>.result`.
    pub fn build(
        &self,
        definition: &CommandDefinition,
        args: &str,
        temp_path: Option<&Path>,
    ) -> Result<ExecutionPlan, BuildError> {
        let template = definition.command_template.trim();
        if template.is_empty() {
            return Err(BuildError::EmptyCommand {
                definition: definition.id.clone(),
            });
        }

        let needs = requirements(definition);
        let temp_path = match (needs.temp_path, temp_path) {
            (true, Some(path)) => Some(path),
            (true, None) => {
                return Err(BuildError::MissingTempPath {
                    definition: definition.id.clone(),
                });
            }
            (false, _) => None,
        };

        let working_dir =
            resolve_working_directory(definition, args, &self.home, self.fs.as_ref());

        let result_file = definition
            .result_file_template
            .as_ref()
            .and(temp_path)
            .map(result_file_path);

        let script_path = if needs.script { temp_path } else { None };

        let values = Placeholders {
            query: args,
            output_file: result_file.as_deref(),
            temp_script: script_path,
            install_dir: &self.install_dir,
        };

        let strategy = match script_path {
            Some(path) => {
                let body = values.substitute(template, Quoting::Shell);
                self.write_script(definition, path, &body)?;
                ExecutionStrategy::Script {
                    path: path.to_path_buf(),
                }
            }
            None => direct_or_shell(template, &values),
        };

        debug!(
            definition = %definition.id,
            ?strategy,
            working_dir = %working_dir.display(),
            result_file = ?result_file,
            "built execution plan"
        );

        Ok(ExecutionPlan {
            strategy,
            working_dir,
            result_file,
        })
    }

    fn write_script(
        &self,
        definition: &CommandDefinition,
        path: &Path,
        body: &str,
    ) -> Result<(), BuildError> {
        let contents = format!("#!/bin/sh\nset -e\n{body}\n");
        self.fs
            .write(path, contents.as_bytes())
            .map_err(|source| BuildError::ScriptWrite {
                path: path.to_path_buf(),
                source,
            })?;

        if let Err(e) = self.fs.set_mode(path, SCRIPT_MODE) {
            warn!(
                definition = %definition.id,
                path = %path.display(),
                error = %e,
                "failed to mark script executable"
            );
        }

        debug!(definition = %definition.id, path = %path.display(), "wrote script file");
        Ok(())
    }
}

/// Whether the template text itself, placeholders aside, needs a shell.
pub fn template_needs_shell(template: &str) -> bool {
    mask(template).contains(SHELL_METACHARACTERS)
}

/// Direct execution when the template allows it, else `sh -c`.
///
/// For direct execution the template is split on whitespace first and each
/// token is substituted with raw values afterwards: no shell parses the
/// tokens, so quoting would end up in the arguments. Tokens that substitute
/// to nothing are dropped.
fn direct_or_shell(template: &str, values: &Placeholders<'_>) -> ExecutionStrategy {
    if !template_needs_shell(template) {
        let mut tokens = template
            .split_whitespace()
            .map(|token| values.substitute(token, Quoting::Raw));

        if let Some(program) = tokens.next().filter(|p| !p.is_empty()) {
            let args = tokens.filter(|a| !a.is_empty()).collect();
            return ExecutionStrategy::Direct { program, args };
        }
    }

    ExecutionStrategy::Shell {
        command: values.substitute(template, Quoting::Shell),
    }
}
