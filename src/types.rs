// src/types.rs

//! Strongly typed enums shared by the config model, the script builder and
//! the result dispatcher.
//!
//! All of them parse case-insensitively, both from TOML (via `try_from =
//! "String"`) and from the CLI (via `FromStr`).

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Where the generated command runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum ExecutionMode {
    /// Run detached from any terminal; stdout may be captured.
    #[default]
    Background,
    /// Run a generated script inside a terminal emulator window.
    Terminal,
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "background" => Ok(ExecutionMode::Background),
            "terminal" => Ok(ExecutionMode::Terminal),
            other => Err(format!(
                "invalid execution_mode: {other} (expected \"background\" or \"terminal\")"
            )),
        }
    }
}

/// How the working directory of the child is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum WorkingDirMode {
    /// The query itself if it names an existing directory, else home.
    QueryOrHome,
    #[default]
    Home,
    /// There is no meaningful "current directory" for a launcher; treated as
    /// `Home`.
    Current,
    /// `explicit_working_dir` from the definition.
    ExplicitPath,
}

impl FromStr for WorkingDirMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queryorhome" => Ok(WorkingDirMode::QueryOrHome),
            "home" => Ok(WorkingDirMode::Home),
            "current" => Ok(WorkingDirMode::Current),
            "explicitpath" => Ok(WorkingDirMode::ExplicitPath),
            other => Err(format!(
                "invalid working_directory_mode: {other} \
                 (expected \"queryorhome\", \"home\", \"current\" or \"explicitpath\")"
            )),
        }
    }
}

/// What the finished command is expected to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum ResultType {
    #[default]
    None,
    PlainText,
    FilePath,
    DirectoryPath,
}

impl ResultType {
    /// Path-typed results are resolved against the working directory and
    /// existence-checked.
    pub fn is_path(self) -> bool {
        matches!(self, ResultType::FilePath | ResultType::DirectoryPath)
    }
}

impl FromStr for ResultType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(ResultType::None),
            "plaintext" => Ok(ResultType::PlainText),
            "filepath" => Ok(ResultType::FilePath),
            "directorypath" => Ok(ResultType::DirectoryPath),
            other => Err(format!(
                "invalid result_type: {other} \
                 (expected \"none\", \"plaintext\", \"filepath\" or \"directorypath\")"
            )),
        }
    }
}

/// Follow-up action used when no action suffix selects another one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum DefaultAction {
    #[default]
    None,
    OpenFileOrCD,
    CopyToClipboard,
    Requery,
}

impl DefaultAction {
    /// Canonical action identifier, or `None` when no action is configured.
    pub fn identifier(self) -> Option<&'static str> {
        match self {
            DefaultAction::None => None,
            DefaultAction::OpenFileOrCD => Some("OpenFileOrCD"),
            DefaultAction::CopyToClipboard => Some("CopyToClipboard"),
            DefaultAction::Requery => Some("Requery"),
        }
    }
}

impl FromStr for DefaultAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(DefaultAction::None),
            "openfileorcd" => Ok(DefaultAction::OpenFileOrCD),
            "copytoclipboard" => Ok(DefaultAction::CopyToClipboard),
            // Older configs used the launcher-specific name.
            "requery" | "krunnerquery" => Ok(DefaultAction::Requery),
            other => Err(format!(
                "invalid default_action: {other} \
                 (expected \"none\", \"openfileorcd\", \"copytoclipboard\" or \"requery\")"
            )),
        }
    }
}

macro_rules! try_from_string {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<String> for $ty {
                type Error = String;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.parse()
                }
            }
        )*
    };
}

try_from_string!(ExecutionMode, WorkingDirMode, ResultType, DefaultAction);

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Background => f.write_str("background"),
            ExecutionMode::Terminal => f.write_str("terminal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("Terminal".parse::<ExecutionMode>(), Ok(ExecutionMode::Terminal));
        assert_eq!(
            " QueryOrHome ".parse::<WorkingDirMode>(),
            Ok(WorkingDirMode::QueryOrHome)
        );
        assert_eq!("FILEPATH".parse::<ResultType>(), Ok(ResultType::FilePath));
        assert_eq!(
            "copyToClipboard".parse::<DefaultAction>(),
            Ok(DefaultAction::CopyToClipboard)
        );
    }

    #[test]
    fn krunnerquery_is_an_alias_for_requery() {
        assert_eq!("KRunnerQuery".parse::<DefaultAction>(), Ok(DefaultAction::Requery));
        assert_eq!(DefaultAction::Requery.identifier(), Some("Requery"));
    }

    #[test]
    fn unknown_values_are_rejected_with_expected_list() {
        let err = "sideways".parse::<ExecutionMode>().unwrap_err();
        assert!(err.contains("sideways"));
        assert!(err.contains("terminal"));
    }

    #[test]
    fn only_path_types_are_paths() {
        assert!(ResultType::FilePath.is_path());
        assert!(ResultType::DirectoryPath.is_path());
        assert!(!ResultType::PlainText.is_path());
        assert!(!ResultType::None.is_path());
    }
}
