// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { contents: Vec<u8>, mode: u32 },
    Dir,
}

/// In-memory filesystem.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect another. Every successful `remove_file` is recorded so tests
/// can assert that a temp file was deleted exactly once.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    removed: Arc<Mutex<Vec<PathBuf>>>,
    full_disk: Arc<Mutex<bool>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock().unwrap();
        if let Some(parent) = path.parent() {
            Self::ensure_dirs(&mut entries, parent);
        }
        entries.insert(
            path.to_path_buf(),
            MockEntry::File {
                contents: contents.into(),
                mode: 0o644,
            },
        );
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock().unwrap();
        Self::ensure_dirs(&mut entries, path.as_ref());
    }

    /// Permission bits of a file, if it exists.
    pub fn mode_of(&self, path: impl AsRef<Path>) -> Option<u32> {
        match self.entries.lock().unwrap().get(path.as_ref()) {
            Some(MockEntry::File { mode, .. }) => Some(*mode),
            _ => None,
        }
    }

    /// Make every later `write` leave an empty file behind and then fail,
    /// the way a full disk does.
    pub fn fail_writes(&self) {
        *self.full_disk.lock().unwrap() = true;
    }

    /// Every file currently present, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<_> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, entry)| matches!(entry, MockEntry::File { .. }))
            .map(|(path, _)| path.clone())
            .collect();
        files.sort();
        files
    }

    /// Every path removed so far, in removal order.
    pub fn removed(&self) -> Vec<PathBuf> {
        self.removed.lock().unwrap().clone()
    }

    fn ensure_dirs(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            entries
                .entry(ancestor.to_path_buf())
                .or_insert(MockEntry::Dir);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::File { contents, .. }) => {
                String::from_utf8(contents.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if *self.full_disk.lock().unwrap() {
            self.add_file(path, Vec::new());
            return Err(anyhow!("No space left on device: {:?}", path));
        }
        self.add_file(path, contents);
        Ok(())
    }

    fn set_mode(&self, path: &Path, new_mode: u32) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get_mut(path) {
            Some(MockEntry::File { mode, .. }) => {
                *mode = new_mode;
                Ok(())
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(path) {
            Some(MockEntry::File { .. }) => {
                entries.remove(path);
                self.removed.lock().unwrap().push(path.to_path_buf());
                Ok(())
            }
            Some(MockEntry::Dir) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.lock().unwrap().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries.lock().unwrap().get(path), Some(MockEntry::Dir))
    }
}
