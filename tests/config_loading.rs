// tests/config_loading.rs

use std::path::{Path, PathBuf};

use cmdrunner::config::{load_and_validate, ConfigFile};
use cmdrunner::errors::RunnerError;
use cmdrunner::types::{DefaultAction, ExecutionMode, ResultType, WorkingDirMode};
use cmdrunner_test_utils::init_tracing;

fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("commands.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

fn load(contents: &str) -> Result<ConfigFile, RunnerError> {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), contents);
    load_and_validate(&path)
}

#[test]
fn full_config_is_loaded_in_file_order() {
    init_tracing();

    let cfg = load(
        r#"
        [general]
        terminal = "kitty"
        temp_dir = "/tmp/cmdrunner-cfg"
        install_dir = "/opt/cmdrunner"

        [command.find_files]
        name = "Find files"
        description = "find by name"
        trigger_words = ["ff", "findfile"]
        command = "find . -name {query}"
        working_directory_mode = "QueryOrHome"
        result_type = "plaintext"
        default_action = "CopyToClipboard"

        [command.find_files.actions]
        code = "OpenFileWithVSCode"
        edit = "kate {SelectedItem}"

        [command.pick_dir]
        trigger_words = ["pd"]
        command = "fzf > {output_file}"
        execution_mode = "terminal"
        result_type = "DirectoryPath"
        result_file = "{output_file}"
        default_action = "OpenFileOrCD"
        working_directory = "~/projects"
        "#,
    )
    .unwrap();

    assert_eq!(cfg.settings.terminal, "kitty");
    assert_eq!(cfg.settings.temp_dir, PathBuf::from("/tmp/cmdrunner-cfg"));
    assert_eq!(cfg.settings.install_dir, PathBuf::from("/opt/cmdrunner"));

    let ids: Vec<_> = cfg.store.definitions().iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["find_files", "pick_dir"]);

    let ff = cfg.store.get("find_files").unwrap();
    assert_eq!(ff.name, "Find files");
    assert_eq!(ff.trigger_words, ["ff", "findfile"]);
    assert_eq!(ff.working_dir_mode, WorkingDirMode::QueryOrHome);
    assert_eq!(ff.result_type, ResultType::PlainText);
    assert_eq!(ff.default_action, DefaultAction::CopyToClipboard);
    assert_eq!(ff.actions.len(), 2);
    assert_eq!(ff.actions["edit"], "kate {SelectedItem}");

    let pd = cfg.store.get("pick_dir").unwrap();
    assert_eq!(pd.name, "pick_dir");
    assert_eq!(pd.execution_mode, ExecutionMode::Terminal);
    assert_eq!(pd.working_dir_mode, WorkingDirMode::ExplicitPath);
    assert_eq!(pd.explicit_working_dir.as_deref(), Some("~/projects"));
    assert_eq!(pd.result_file_template.as_deref(), Some("{output_file}"));
}

#[test]
fn invalid_definitions_are_skipped() {
    init_tracing();

    let cfg = load(
        r#"
        [command.good]
        trigger_words = ["g"]
        command = "echo good"

        [command.no_triggers]
        trigger_words = ["  "]
        command = "echo nope"

        [command.bad_mode]
        trigger_words = ["b"]
        command = "echo b"
        execution_mode = "sideways"

        [command.terminal_stdout]
        trigger_words = ["t"]
        command = "ls"
        execution_mode = "terminal"
        result_type = "plaintext"
        "#,
    )
    .unwrap();

    let ids: Vec<_> = cfg.store.definitions().iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["good"]);
}

#[test]
fn file_without_valid_definitions_is_rejected() {
    init_tracing();

    let err = load(
        r#"
        [command.empty]
        trigger_words = ["e"]
        command = "   "
        "#,
    )
    .unwrap_err();
    assert!(matches!(err, RunnerError::ConfigError(_)), "got {err:?}");

    let err = load("[general]\nterminal = \"xterm\"\n").unwrap_err();
    assert!(matches!(err, RunnerError::ConfigError(_)), "got {err:?}");
}

#[test]
fn malformed_toml_and_missing_file_are_errors() {
    init_tracing();

    let err = load("[command.x\ntrigger_words = [").unwrap_err();
    assert!(matches!(err, RunnerError::TomlError(_)), "got {err:?}");

    let dir = tempfile::tempdir().unwrap();
    let err = load_and_validate(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, RunnerError::IoError(_)), "got {err:?}");
}

#[test]
fn general_section_defaults() {
    init_tracing();

    let cfg = load(
        r#"
        [general]
        terminal = "  "
        temp_dir = "~/cmdrunner-tmp"

        [command.x]
        trigger_words = ["x"]
        command = "true"
        "#,
    )
    .unwrap();

    assert_eq!(cfg.settings.terminal, "konsole");
    assert!(cfg.settings.terminal_args.is_none());
    assert!(!cfg.settings.temp_dir.to_string_lossy().starts_with('~'));
    assert!(cfg.settings.temp_dir.ends_with("cmdrunner-tmp"));
}
