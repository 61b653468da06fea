// src/exec/temp.rs

use std::path::{Path, PathBuf};

use anyhow::Result;
use uuid::Uuid;

use crate::fs::FileSystem;

/// Allocate a fresh temporary path under `temp_dir`, creating the directory
/// if it is missing.
///
/// Nothing is written to the path itself. `.sh` is appended when the path
/// will hold a generated script.
pub fn allocate_temp_path(fs: &dyn FileSystem, temp_dir: &Path, script: bool) -> Result<PathBuf> {
    if !fs.is_dir(temp_dir) {
        fs.create_dir_all(temp_dir)?;
    }

    let mut name = format!("cmdrunner-{}", Uuid::new_v4().simple());
    if script {
        name.push_str(".sh");
    }
    Ok(temp_dir.join(name))
}
