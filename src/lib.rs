// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod matcher;
pub mod result;
pub mod script;
pub mod types;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, resolve_config_path, ConfigFile};
use crate::engine::{Supervisor, SupervisorEvent, SupervisorOptions};
use crate::errors::RunnerError;
use crate::exec::temp::allocate_temp_path;
use crate::exec::{SpawnRequest, TokioProcessBackend};
use crate::fs::{remove_if_exists, FileSystem, RealFileSystem};
use crate::matcher::{best_match, match_query};
use crate::result::{DesktopHost, ResultDispatcher};
use crate::script::workdir::home_dir;
use crate::script::{requirements, result_file_path, ScriptBuilder};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - query matching (`--list`) and plan printing (`--dry-run`)
/// - supervisor, process backend and result dispatcher
/// - stdin query feed
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config.as_deref());
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let query = args.query_text();

    if args.list {
        print_matches(&cfg, &query);
        return Ok(());
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let builder = ScriptBuilder::new(
        Arc::clone(&fs),
        home_dir(),
        cfg.settings.install_dir.clone(),
    );

    if args.dry_run {
        return print_dry_run(&cfg, &builder, fs.as_ref(), &query, args.action.as_deref());
    }

    if !args.stdin && query.trim().is_empty() {
        bail!("no query given; pass a QUERY or use --stdin");
    }

    // Supervisor event channel.
    let (tx, rx) = mpsc::channel::<SupervisorEvent>(64);

    let backend = TokioProcessBackend::new(tx.clone());
    let host = DesktopHost::new(Some(tx.clone()));
    let clipboard = host.clipboard_owners();
    let dispatcher = ResultDispatcher::new(
        Arc::clone(&fs),
        host,
        cfg.settings.install_dir.clone(),
    );

    // Ctrl-C → teardown.
    {
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(SupervisorEvent::Shutdown).await;
        });
    }

    if args.stdin {
        spawn_stdin_feed(tx.clone(), args.action.clone());
    } else {
        tx.send(SupervisorEvent::Query {
            query,
            action_suffix: args.action.clone(),
        })
        .await?;
        tx.send(SupervisorEvent::InputClosed).await?;
    }

    let options = SupervisorOptions {
        exit_when_idle: true,
    };
    let supervisor = Supervisor::new(cfg, builder, dispatcher, backend, fs, rx, options);
    supervisor.run().await?;

    if !clipboard.is_empty() {
        info!("keeping copied text until another application takes the clipboard");
        tokio::select! {
            _ = clipboard.released() => {}
            _ = tokio::signal::ctrl_c() => info!("interrupted; dropping clipboard contents"),
        }
    }
    Ok(())
}

/// Forward each non-empty stdin line as a query, then close input.
fn spawn_stdin_feed(tx: mpsc::Sender<SupervisorEvent>, action_suffix: Option<String>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let event = SupervisorEvent::Query {
                        query: line,
                        action_suffix: action_suffix.clone(),
                    };
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(error = %e, "failed reading stdin; closing input");
                    break;
                }
            }
        }
        info!("stdin closed");
        let _ = tx.send(SupervisorEvent::InputClosed).await;
    });
}

fn print_matches(cfg: &ConfigFile, query: &str) {
    let matches = match_query(&cfg.store, query);
    if matches.is_empty() {
        println!("no matches for {query:?}");
        return;
    }
    for m in matches {
        let Some(def) = cfg.store.get(&m.definition_id) else {
            continue;
        };
        let action = m.action_suffix.as_deref().unwrap_or("-");
        println!(
            "{:.1}  {:<20} action={:<12} args={:?}  ({})",
            m.relevance, def.name, action, m.args, def.description
        );
    }
}

/// Print the plan the first match would run. A script written for the plan
/// is shown and then removed.
fn print_dry_run(
    cfg: &ConfigFile,
    builder: &ScriptBuilder,
    fs: &dyn FileSystem,
    query: &str,
    action_suffix: Option<&str>,
) -> Result<()> {
    let matches = match_query(&cfg.store, query);
    let chosen = best_match(&matches, action_suffix)
        .ok_or_else(|| RunnerError::NoMatch(query.to_string()))?;
    let definition = cfg
        .store
        .get(&chosen.definition_id)
        .ok_or_else(|| RunnerError::DefinitionNotFound(chosen.definition_id.clone()))?;

    let needs = requirements(&definition);
    let temp_path = if needs.temp_path {
        Some(allocate_temp_path(fs, &cfg.settings.temp_dir, needs.script)?)
    } else {
        None
    };

    let built = builder.build(&definition, &chosen.args, temp_path.as_deref());

    println!("cmdrunner dry-run");
    println!("  definition: {} ({})", definition.id, definition.name);
    println!("  args: {:?}", chosen.args);
    println!("  mode: {}", definition.execution_mode);
    if let Ok(plan) = &built {
        for line in plan.to_string().lines() {
            println!("  {line}");
        }
        let request = SpawnRequest::from_plan(plan, &definition, &cfg.settings);
        println!("  argv: {} {:?}", request.program, request.args);
        if let Some(script) = plan.script_path() {
            if let Ok(body) = fs.read_to_string(script) {
                println!("  --- script ---");
                print!("{body}");
                println!("  --------------");
            }
        }
    }

    if let Some(temp) = &temp_path {
        remove_if_exists(fs, temp);
        remove_if_exists(fs, &result_file_path(temp));
    }

    debug!("dry-run complete (no execution)");
    built.map_err(RunnerError::from)?;
    Ok(())
}
