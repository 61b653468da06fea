// tests/supervisor_cleanup.rs

mod common;

use std::path::Path;

use common::{feed, Harness, TEMP_DIR};

use cmdrunner::config::ConfigFile;
use cmdrunner::engine::{ProcessErrorKind, ProcessHandle, ProcessStatus, SupervisorEvent};
use cmdrunner::exec::SpawnRequest;
use cmdrunner::types::{DefaultAction, ResultType};
use cmdrunner_test_utils::builders::{ConfigFileBuilder, DefinitionBuilder};
use cmdrunner_test_utils::fake_backend::FakeBehaviour;
use cmdrunner_test_utils::init_tracing;
use cmdrunner_test_utils::recording_host::HostCall;

fn find_config() -> ConfigFile {
    ConfigFileBuilder::new()
        .temp_dir(TEMP_DIR)
        .with_definition(
            DefinitionBuilder::new("ff", "ff", "find . -name {query}")
                .result_type(ResultType::PlainText)
                .default_action(DefaultAction::CopyToClipboard)
                .action("edit", "code --goto {SelectedItem}")
                .build(),
        )
        .build()
}

fn terminal_config() -> ConfigFile {
    ConfigFileBuilder::new()
        .temp_dir(TEMP_DIR)
        .with_definition(DefinitionBuilder::new("top", "top", "htop").terminal().build())
        .build()
}

fn only_script(removed: &[std::path::PathBuf]) -> &Path {
    assert_eq!(removed.len(), 1, "expected exactly one removal, got {removed:?}");
    let script = removed[0].as_path();
    assert!(script.starts_with(TEMP_DIR));
    assert_eq!(script.extension().and_then(|e| e.to_str()), Some("sh"));
    script
}

#[tokio::test]
async fn stdout_result_runs_directly_and_is_copied() {
    init_tracing();

    let h = Harness::new(find_config(), FakeBehaviour::stdout("a.log\nb.log\n"));
    feed(&h.tx, &["ff *.log"]).await;
    let report = h.run_to_end().await;

    let (handle, request) = &report.log.spawned[0];
    assert_eq!(
        request,
        &SpawnRequest {
            program: "find".into(),
            args: vec![".".into(), "-name".into(), "*.log".into()],
            working_dir: common::HOME.into(),
            capture_stdout: true,
        }
    );
    assert_eq!(report.calls, vec![HostCall::CopyText("a.log\nb.log".into())]);
    assert!(report.fs.removed().is_empty());
    assert_eq!(report.log.released, vec![*handle]);
}

#[tokio::test]
async fn action_suffix_selects_custom_action() {
    init_tracing();

    let h = Harness::new(find_config(), FakeBehaviour::stdout("a.log\n"));
    h.tx
        .send(SupervisorEvent::Query {
            query: "ff *.log".into(),
            action_suffix: Some("edit".into()),
        })
        .await
        .unwrap();
    h.tx.send(SupervisorEvent::InputClosed).await.unwrap();
    let report = h.run_to_end().await;

    assert_eq!(
        report.calls,
        vec![HostCall::Launch {
            program: "code".into(),
            args: vec!["--goto".into(), "a.log".into()],
        }]
    );
}

#[tokio::test]
async fn terminal_script_is_removed_once_after_finish() {
    init_tracing();

    let h = Harness::new(terminal_config(), FakeBehaviour::stdout("ignored"));
    feed(&h.tx, &["top"]).await;
    let report = h.run_to_end().await;

    let removed = report.fs.removed();
    let script = only_script(&removed);

    let (_, request) = &report.log.spawned[0];
    assert_eq!(request.program, "konsole");
    assert_eq!(request.args.last().map(String::as_str), script.to_str());
    assert!(!request.capture_stdout);

    assert!(report.calls.is_empty());
    assert_eq!(report.log.released.len(), 1);
    assert!(report.log.killed.is_empty());
}

#[tokio::test]
async fn crashed_child_is_cleaned_up_without_action() {
    init_tracing();

    let h = Harness::new(terminal_config(), FakeBehaviour::Crash);
    feed(&h.tx, &["top"]).await;
    let report = h.run_to_end().await;

    only_script(&report.fs.removed());
    assert!(report.calls.is_empty());
    assert_eq!(report.log.released.len(), 1);
}

#[tokio::test]
async fn failed_start_is_cleaned_up_and_supervisor_exits() {
    init_tracing();

    let h = Harness::new(terminal_config(), FakeBehaviour::FailToStart);
    feed(&h.tx, &["top"]).await;
    let report = h.run_to_end().await;

    assert_eq!(report.log.spawned.len(), 1);
    only_script(&report.fs.removed());
    assert_eq!(report.log.released, vec![ProcessHandle(1)]);
    assert!(report.calls.is_empty());
}

#[tokio::test]
async fn shutdown_kills_and_cleans_running_children() {
    init_tracing();

    let h = Harness::new(terminal_config(), FakeBehaviour::Hang);
    for _ in 0..2 {
        h.tx
            .send(SupervisorEvent::Query {
                query: "top".into(),
                action_suffix: None,
            })
            .await
            .unwrap();
    }
    h.tx.send(SupervisorEvent::Shutdown).await.unwrap();
    let report = h.run_to_end().await;

    assert_eq!(report.log.killed, vec![ProcessHandle(1), ProcessHandle(2)]);
    assert_eq!(report.fs.removed().len(), 2);
    assert_eq!(report.log.released, vec![ProcessHandle(1), ProcessHandle(2)]);
    assert!(report.calls.is_empty());
}

#[test]
fn error_then_finish_cleans_up_exactly_once() {
    init_tracing();

    let mut h = Harness::new(terminal_config(), FakeBehaviour::Hang);
    let handle = h.supervisor.execute_query("top", None).expect("spawned");
    assert_eq!(h.supervisor.running(), 1);

    h.supervisor.handle_event(SupervisorEvent::ErrorOccurred {
        handle,
        kind: ProcessErrorKind::ReadError,
        message: "pipe closed".into(),
    });
    h.supervisor.handle_event(SupervisorEvent::Finished {
        handle,
        exit_code: 0,
        status: ProcessStatus::Normal,
    });

    assert_eq!(h.supervisor.running(), 0);
    only_script(&h.fs.removed());
    assert_eq!(h.log().released, vec![handle]);
    assert!(h.calls().is_empty());
}

#[test]
fn late_events_for_finished_child_are_ignored() {
    init_tracing();

    let mut h = Harness::new(find_config(), FakeBehaviour::Hang);
    let handle = h.supervisor.execute_query("ff x", None).expect("spawned");

    h.supervisor.handle_event(SupervisorEvent::StdoutReady {
        handle,
        bytes: b"x.log\n".to_vec(),
    });
    for _ in 0..2 {
        h.supervisor.handle_event(SupervisorEvent::Finished {
            handle,
            exit_code: 0,
            status: ProcessStatus::Normal,
        });
    }
    h.supervisor.handle_event(SupervisorEvent::StdoutReady {
        handle,
        bytes: b"late".to_vec(),
    });

    assert_eq!(h.calls(), vec![HostCall::CopyText("x.log".into())]);
    assert_eq!(h.log().released, vec![handle]);
}

#[tokio::test]
async fn requery_feeds_a_new_query_back() {
    init_tracing();

    let cfg = ConfigFileBuilder::new()
        .temp_dir(TEMP_DIR)
        .with_definition(
            DefinitionBuilder::new("first", "first", "echo second")
                .result_type(ResultType::PlainText)
                .default_action(DefaultAction::Requery)
                .build(),
        )
        .with_definition(DefinitionBuilder::new("second", "second", "true").build())
        .build();

    let h = Harness::new(cfg, FakeBehaviour::stdout("second x\n"));
    feed(&h.tx, &["first"]).await;
    let report = h.run_to_end().await;

    let programs: Vec<_> = report
        .log
        .spawned
        .iter()
        .map(|(_, r)| r.program.as_str())
        .collect();
    assert_eq!(programs, ["echo", "true"]);
    assert_eq!(report.calls, vec![HostCall::Requery("second x".into())]);
}

#[test]
fn unknown_definition_is_not_spawned() {
    init_tracing();

    let mut h = Harness::new(find_config(), FakeBehaviour::Hang);
    assert!(h.supervisor.handle_event(SupervisorEvent::Execute {
        definition_id: "missing".into(),
        args: String::new(),
        action_suffix: None,
    }));
    assert!(h.supervisor.execute_query("nothing matches", None).is_none());
    assert!(h.log().spawned.is_empty());
}

#[test]
fn script_write_failure_spawns_nothing_and_leaves_no_files() {
    init_tracing();

    let mut h = Harness::new(terminal_config(), FakeBehaviour::Hang);
    h.fs.fail_writes();

    assert!(h.supervisor.execute_query("top", None).is_none());
    assert_eq!(h.supervisor.running(), 0);
    assert!(h.log().spawned.is_empty());
    only_script(&h.fs.removed());
    assert!(h.fs.files().is_empty(), "left behind: {:?}", h.fs.files());
}

#[tokio::test]
async fn unknown_action_suffix_runs_the_default_match() {
    init_tracing();

    let h = Harness::new(find_config(), FakeBehaviour::stdout("a.log\n"));
    h.tx
        .send(SupervisorEvent::Query {
            query: "ff *.log".into(),
            action_suffix: Some("nope".into()),
        })
        .await
        .unwrap();
    h.tx.send(SupervisorEvent::InputClosed).await.unwrap();
    let report = h.run_to_end().await;

    assert_eq!(report.log.spawned.len(), 1);
    assert_eq!(report.calls, vec![HostCall::CopyText("a.log".into())]);
}
