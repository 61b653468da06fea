// src/result/dispatcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::CommandDefinition;
use crate::engine::ProcessStatus;
use crate::fs::{remove_if_exists, FileSystem};
use crate::types::{DefaultAction, ResultType};

use super::actions::{select_action, Action};
use super::custom::run_custom_action;
use super::extractor::{read_result_file, resolve_path_result, stdout_value};
use super::host::ActionHost;

/// Terminal state of one child, handed over by the supervisor.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub exit_code: i32,
    pub status: ProcessStatus,
    pub definition: Arc<CommandDefinition>,
    pub stdout: Vec<u8>,
    pub result_file: Option<PathBuf>,
    pub working_dir: PathBuf,
    pub action_suffix: Option<String>,
}

/// Extracts a result from a finished child and runs its follow-up action.
#[derive(Debug)]
pub struct ResultDispatcher<H: ActionHost> {
    fs: Arc<dyn FileSystem>,
    host: H,
    install_dir: PathBuf,
}

impl<H: ActionHost> ResultDispatcher<H> {
    pub fn new(fs: Arc<dyn FileSystem>, host: H, install_dir: PathBuf) -> Self {
        Self {
            fs,
            host,
            install_dir,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Handle one finished child.
    ///
    /// Returns the action that was selected, if any. Failures are logged and
    /// end handling early; nothing is reported to the caller.
    pub fn handle_result(&mut self, outcome: ProcessOutcome) -> Option<Action> {
        let definition = Arc::clone(&outcome.definition);

        if outcome.status != ProcessStatus::Normal || outcome.exit_code != 0 {
            warn!(
                definition = %definition.id,
                exit_code = outcome.exit_code,
                status = ?outcome.status,
                "command did not succeed; no follow-up action"
            );
            self.discard_result_file(&outcome);
            return None;
        }

        if definition.result_type == ResultType::None
            && definition.default_action == DefaultAction::None
            && outcome.action_suffix.is_none()
        {
            debug!(definition = %definition.id, "no result expected");
            self.discard_result_file(&outcome);
            return None;
        }

        let (value, read_failed) = match &outcome.result_file {
            Some(path) => match read_result_file(self.fs.as_ref(), path) {
                Ok(value) => (value, false),
                Err(e) => {
                    warn!(definition = %definition.id, error = %e, "could not read result");
                    (String::new(), true)
                }
            },
            None if definition.result_type != ResultType::None => {
                (stdout_value(&outcome.stdout), false)
            }
            None => (String::new(), false),
        };

        if read_failed && definition.result_type != ResultType::None {
            return None;
        }

        let value = resolve_path_result(
            &value,
            definition.result_type,
            &outcome.working_dir,
            self.fs.as_ref(),
        );

        let Some(action) =
            select_action(&definition, outcome.action_suffix.as_deref(), &self.install_dir)
        else {
            debug!(definition = %definition.id, "no action configured");
            return None;
        };

        if action.requires_result() && value.is_empty() {
            info!(
                definition = %definition.id,
                ?action,
                "no usable result; skipping action"
            );
            return Some(action);
        }

        debug!(definition = %definition.id, ?action, "running follow-up action");
        self.run_action(&action, &value, &outcome.working_dir);
        Some(action)
    }

    fn run_action(&mut self, action: &Action, value: &str, working_dir: &Path) {
        let result = match action {
            Action::OpenFileOrCD => self.host.open_path(Path::new(value)),
            Action::CopyToClipboard => self.host.copy_text(value),
            Action::Requery => self.host.requery(value),
            Action::OpenFileWithVSCode | Action::OpenFileWithKate => {
                let app = action.application().unwrap_or_default();
                self.host.open_with(app, Path::new(value))
            }
            Action::Custom(template) => {
                run_custom_action(&mut self.host, template, value, &self.install_dir, working_dir);
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!(?action, error = %e, "follow-up action failed");
        }
    }

    fn discard_result_file(&self, outcome: &ProcessOutcome) {
        if let Some(path) = &outcome.result_file {
            remove_if_exists(self.fs.as_ref(), path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use anyhow::Result;

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl ActionHost for Recorder {
        fn open_path(&mut self, path: &Path) -> Result<()> {
            self.calls.push(format!("open {}", path.display()));
            Ok(())
        }
        fn copy_text(&mut self, text: &str) -> Result<()> {
            self.calls.push(format!("copy {text}"));
            Ok(())
        }
        fn requery(&mut self, query: &str) -> Result<()> {
            self.calls.push(format!("requery {query}"));
            Ok(())
        }
        fn open_with(&mut self, app: &str, path: &Path) -> Result<()> {
            self.calls.push(format!("{app} {}", path.display()));
            Ok(())
        }
        fn launch_detached(&mut self, program: &str, args: &[String], _: &Path) -> Result<()> {
            self.calls.push(format!("launch {program} {}", args.join(" ")));
            Ok(())
        }
    }

    fn outcome(def: CommandDefinition, stdout: &str) -> ProcessOutcome {
        ProcessOutcome {
            exit_code: 0,
            status: ProcessStatus::Normal,
            definition: Arc::new(def),
            stdout: stdout.as_bytes().to_vec(),
            result_file: None,
            working_dir: PathBuf::from("/home/me"),
            action_suffix: None,
        }
    }

    fn dispatcher(fs: &MockFileSystem) -> ResultDispatcher<Recorder> {
        ResultDispatcher::new(Arc::new(fs.clone()), Recorder::default(), PathBuf::from("/opt"))
    }

    fn copy_def() -> CommandDefinition {
        let mut def = CommandDefinition::new("ff", vec!["ff".into()], "find . -name {query}");
        def.result_type = ResultType::PlainText;
        def.default_action = DefaultAction::CopyToClipboard;
        def
    }

    #[test]
    fn stdout_is_copied_to_clipboard() {
        let fs = MockFileSystem::new();
        let mut d = dispatcher(&fs);
        let action = d.handle_result(outcome(copy_def(), "a.log\nb.log\n"));

        assert_eq!(action, Some(Action::CopyToClipboard));
        assert_eq!(d.host().calls, vec!["copy a.log\nb.log"]);
    }

    #[test]
    fn non_zero_exit_runs_nothing_and_removes_result_file() {
        let fs = MockFileSystem::new();
        fs.add_file("/tmp/x.result", "junk");
        let mut out = outcome(copy_def(), "a.log");
        out.exit_code = 2;
        out.result_file = Some(PathBuf::from("/tmp/x.result"));

        let mut d = dispatcher(&fs);
        assert_eq!(d.handle_result(out), None);
        assert!(d.host().calls.is_empty());
        assert!(!fs.exists(Path::new("/tmp/x.result")));
    }

    #[test]
    fn crashed_child_runs_nothing() {
        let fs = MockFileSystem::new();
        let mut out = outcome(copy_def(), "a.log");
        out.status = ProcessStatus::Crashed;
        let mut d = dispatcher(&fs);
        assert_eq!(d.handle_result(out), None);
        assert!(d.host().calls.is_empty());
    }

    #[test]
    fn result_file_wins_over_stdout() {
        let fs = MockFileSystem::new();
        fs.add_file("/tmp/x.result", "\x1b[32mpicked\x1b[0m\n");
        let mut out = outcome(copy_def(), "ignored");
        out.result_file = Some(PathBuf::from("/tmp/x.result"));

        let mut d = dispatcher(&fs);
        d.handle_result(out);
        assert_eq!(d.host().calls, vec!["copy picked"]);
        assert!(!fs.exists(Path::new("/tmp/x.result")));
    }

    #[test]
    fn unreadable_result_file_aborts() {
        let fs = MockFileSystem::new();
        let mut out = outcome(copy_def(), "");
        out.result_file = Some(PathBuf::from("/tmp/missing.result"));

        let mut d = dispatcher(&fs);
        assert_eq!(d.handle_result(out), None);
        assert!(d.host().calls.is_empty());
    }

    #[test]
    fn relative_file_result_is_opened_by_absolute_path() {
        let fs = MockFileSystem::new();
        fs.add_file("/home/me/src/main.rs", "");
        let mut def = copy_def();
        def.result_type = ResultType::FilePath;
        def.default_action = DefaultAction::OpenFileOrCD;

        let mut d = dispatcher(&fs);
        d.handle_result(outcome(def, "src/main.rs\n"));
        assert_eq!(d.host().calls, vec!["open /home/me/src/main.rs"]);
    }

    #[test]
    fn missing_path_result_skips_action() {
        let fs = MockFileSystem::new();
        let mut def = copy_def();
        def.result_type = ResultType::FilePath;
        def.default_action = DefaultAction::OpenFileOrCD;

        let mut d = dispatcher(&fs);
        let action = d.handle_result(outcome(def, "nope.txt"));
        assert_eq!(action, Some(Action::OpenFileOrCD));
        assert!(d.host().calls.is_empty());
    }

    #[test]
    fn suffix_action_overrides_default() {
        let fs = MockFileSystem::new();
        fs.add_file("/home/me/a.log", "");
        let mut def = copy_def();
        def.actions.insert("code".into(), "OpenFileWithVSCode".into());
        def.actions.insert("less".into(), "konsole -e less {SelectedItem}".into());

        let mut d = dispatcher(&fs);
        let mut out = outcome(def.clone(), "/home/me/a.log");
        out.action_suffix = Some("code".into());
        d.handle_result(out);

        let mut out = outcome(def, "/home/me/a.log");
        out.action_suffix = Some("less".into());
        d.handle_result(out);

        assert_eq!(
            d.host().calls,
            vec!["code /home/me/a.log", "launch konsole -e less /home/me/a.log"]
        );
    }

    #[test]
    fn requery_hands_value_back() {
        let fs = MockFileSystem::new();
        let mut def = copy_def();
        def.default_action = DefaultAction::Requery;
        let mut d = dispatcher(&fs);
        d.handle_result(outcome(def, "ff *.rs"));
        assert_eq!(d.host().calls, vec!["requery ff *.rs"]);
    }

    #[test]
    fn nothing_expected_means_nothing_done() {
        let fs = MockFileSystem::new();
        let def = CommandDefinition::new("x", vec!["x".into()], "true");
        let mut d = dispatcher(&fs);
        assert_eq!(d.handle_result(outcome(def, "output")), None);
        assert!(d.host().calls.is_empty());
    }
}
