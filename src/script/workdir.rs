// src/script/workdir.rs

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::CommandDefinition;
use crate::fs::FileSystem;
use crate::types::WorkingDirMode;

/// The user's home directory, or `/` if it cannot be determined.
pub fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"))
}

/// Choose the working directory for a run of `definition` with `args`.
///
/// Never fails: every unusable choice falls back to `home`.
pub fn resolve_working_directory(
    definition: &CommandDefinition,
    args: &str,
    home: &Path,
    fs: &dyn FileSystem,
) -> PathBuf {
    match definition.working_dir_mode {
        WorkingDirMode::QueryOrHome => {
            let looks_like_path = args.contains('/') || args.contains('\\');
            if !args.is_empty() && looks_like_path && fs.is_dir(Path::new(args)) {
                absolute(Path::new(args))
            } else {
                home.to_path_buf()
            }
        }
        WorkingDirMode::Home => home.to_path_buf(),
        WorkingDirMode::Current => {
            warn!(
                definition = %definition.id,
                "working directory mode 'current' has no meaning here; using home"
            );
            home.to_path_buf()
        }
        WorkingDirMode::ExplicitPath => {
            let raw = definition.explicit_working_dir.as_deref().unwrap_or_default();
            let expanded = shellexpand::tilde_with_context(raw, || home.to_str());
            let path = PathBuf::from(expanded.as_ref());

            if !raw.is_empty() && fs.is_dir(&path) {
                absolute(&path)
            } else {
                warn!(
                    definition = %definition.id,
                    path = %path.display(),
                    "explicit working directory does not exist; using home"
                );
                home.to_path_buf()
            }
        }
    }
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn definition(mode: WorkingDirMode, explicit: Option<&str>) -> CommandDefinition {
        let mut def = CommandDefinition::new("t", vec!["t".into()], "ls");
        def.working_dir_mode = mode;
        def.explicit_working_dir = explicit.map(str::to_string);
        def
    }

    fn fs() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_dir("/home/me/projects");
        fs.add_dir("/srv/data");
        fs
    }

    const HOME: &str = "/home/me";

    #[test]
    fn query_or_home_uses_existing_directory() {
        let def = definition(WorkingDirMode::QueryOrHome, None);
        let dir = resolve_working_directory(&def, "/srv/data", Path::new(HOME), &fs());
        assert_eq!(dir, PathBuf::from("/srv/data"));
    }

    #[test]
    fn query_or_home_requires_a_separator() {
        let fs = fs();
        fs.add_dir("data");
        let def = definition(WorkingDirMode::QueryOrHome, None);
        let dir = resolve_working_directory(&def, "data", Path::new(HOME), &fs);
        assert_eq!(dir, PathBuf::from(HOME));
    }

    #[test]
    fn query_or_home_falls_back_for_missing_directory() {
        let def = definition(WorkingDirMode::QueryOrHome, None);
        let dir = resolve_working_directory(&def, "/nope/here", Path::new(HOME), &fs());
        assert_eq!(dir, PathBuf::from(HOME));
    }

    #[test]
    fn current_is_treated_as_home() {
        let def = definition(WorkingDirMode::Current, None);
        let dir = resolve_working_directory(&def, "/srv/data", Path::new(HOME), &fs());
        assert_eq!(dir, PathBuf::from(HOME));
    }

    #[test]
    fn explicit_path_expands_tilde() {
        let def = definition(WorkingDirMode::ExplicitPath, Some("~/projects"));
        let dir = resolve_working_directory(&def, "", Path::new(HOME), &fs());
        assert_eq!(dir, PathBuf::from("/home/me/projects"));
    }

    #[test]
    fn explicit_path_missing_falls_back_to_home() {
        let def = definition(WorkingDirMode::ExplicitPath, Some("/does/not/exist"));
        let dir = resolve_working_directory(&def, "", Path::new(HOME), &fs());
        assert_eq!(dir, PathBuf::from(HOME));
    }
}
