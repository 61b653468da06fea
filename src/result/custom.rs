// src/result/custom.rs

//! Custom action executor: expands a user-supplied command template with the
//! result value and launches it detached.

use std::path::Path;

use tracing::{info, warn};

use super::host::ActionHost;

pub const SELECTED_ITEM: &str = "{SelectedItem}";
pub const INSTALL_DIR: &str = "{install_dir}";

/// Expand `template` into a program and its arguments.
///
/// The template is split on whitespace before substitution, so a result
/// containing spaces stays one argument. Returns `None` when the template
/// needs a result and `selected` is empty, or when nothing is left to run.
pub fn expand(template: &str, selected: &str, install_dir: &Path) -> Option<(String, Vec<String>)> {
    if template.contains(SELECTED_ITEM) && selected.is_empty() {
        return None;
    }

    let install_dir = install_dir.to_string_lossy();
    let mut tokens = template
        .split_whitespace()
        .map(|t| t.replace(SELECTED_ITEM, selected).replace(INSTALL_DIR, &install_dir));

    let program = tokens.next().filter(|p| !p.is_empty())?;
    Some((program, tokens.collect()))
}

/// Expand and launch `template`. Fire and forget: nothing is tracked.
pub fn run_custom_action(
    host: &mut dyn ActionHost,
    template: &str,
    selected: &str,
    install_dir: &Path,
    working_dir: &Path,
) {
    let Some((program, args)) = expand(template, selected, install_dir) else {
        warn!(%template, "custom action skipped: no result to substitute or empty command");
        return;
    };

    info!(%program, ?args, "launching custom action");
    if let Err(e) = host.launch_detached(&program, &args, working_dir) {
        warn!(%program, error = %e, "failed to launch custom action");
    }
}
