// src/result/extractor.rs

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::fs::{remove_if_exists, FileSystem};
use crate::types::ResultType;

static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*[A-Za-z]").expect("ANSI pattern is valid"));

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("failed to read result file {path:?}: {source}")]
    ResultRead {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

pub fn strip_ansi(text: &str) -> String {
    ANSI_RE.replace_all(text, "").into_owned()
}

/// ANSI escapes removed, surrounding whitespace trimmed.
pub fn clean(text: &str) -> String {
    strip_ansi(text).trim().to_string()
}

/// Read and clean the result file, then delete it whether or not the read
/// succeeded. A missing file is a read failure.
pub fn read_result_file(fs: &dyn FileSystem, path: &Path) -> Result<String, ExtractError> {
    let read = fs.read_to_string(path);
    remove_if_exists(fs, path);

    match read {
        Ok(contents) => {
            debug!(path = %path.display(), "read result file");
            Ok(clean(&contents))
        }
        Err(source) => Err(ExtractError::ResultRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Clean captured stdout, decoding invalid UTF-8 lossily.
pub fn stdout_value(stdout: &[u8]) -> String {
    clean(&String::from_utf8_lossy(stdout))
}

/// Resolve a path-typed result against `working_dir` and check that it
/// exists.
///
/// Returns an empty string when the path does not exist, so callers see "no
/// usable result" rather than an error. Non-path types pass through.
pub fn resolve_path_result(
    value: &str,
    result_type: ResultType,
    working_dir: &Path,
    fs: &dyn FileSystem,
) -> String {
    if !result_type.is_path() || value.is_empty() {
        return value.to_string();
    }

    let path = Path::new(value);
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        working_dir.join(path)
    };

    if fs.exists(&resolved) {
        resolved.to_string_lossy().into_owned()
    } else {
        debug!(path = %resolved.display(), "path result does not exist; discarding");
        String::new()
    }
}
