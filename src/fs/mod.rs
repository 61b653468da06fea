// src/fs/mod.rs

//! Filesystem seam used by the script builder (writing scripts, checking
//! working directories), the result extractor (reading result files) and the
//! supervisor (temp-file cleanup).

use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    /// Create or truncate `path`, creating parent directories as needed.
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn set_mode(&self, path: &Path, mode: u32) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        let mut file = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        file.write_all(contents).with_context(|| format!("writing to file {:?}", path))?;
        Ok(())
    }

    #[cfg(unix)]
    fn set_mode(&self, path: &Path, mode: u32) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .with_context(|| format!("setting mode {:o} on {:?}", mode, path))
    }

    #[cfg(not(unix))]
    fn set_mode(&self, _path: &Path, _mode: u32) -> Result<()> {
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_context(|| format!("removing file {:?}", path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).with_context(|| format!("creating dir {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// Remove `path` if it exists, logging rather than failing.
///
/// Returns `true` when a file was actually removed.
pub fn remove_if_exists(fs: &dyn FileSystem, path: &Path) -> bool {
    if !fs.exists(path) {
        return false;
    }
    match fs.remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed temporary file");
            true
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove temporary file");
            false
        }
    }
}
