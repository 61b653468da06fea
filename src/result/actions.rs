// src/result/actions.rs

use std::path::Path;

use crate::config::CommandDefinition;

/// A follow-up action, parsed once from its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    OpenFileOrCD,
    CopyToClipboard,
    Requery,
    OpenFileWithVSCode,
    OpenFileWithKate,
    /// Any other identifier is a command template for the custom executor.
    Custom(String),
}

impl Action {
    pub fn parse(identifier: &str) -> Self {
        match identifier.trim() {
            "OpenFileOrCD" => Action::OpenFileOrCD,
            "CopyToClipboard" => Action::CopyToClipboard,
            "Requery" | "KRunnerQuery" => Action::Requery,
            "OpenFileWithVSCode" => Action::OpenFileWithVSCode,
            "OpenFileWithKate" => Action::OpenFileWithKate,
            other => Action::Custom(other.to_string()),
        }
    }

    /// Built-in actions do nothing useful without a result value.
    pub fn requires_result(&self) -> bool {
        !matches!(self, Action::Custom(_))
    }

    /// Application used by the "open with" actions.
    pub fn application(&self) -> Option<&'static str> {
        match self {
            Action::OpenFileWithVSCode => Some("code"),
            Action::OpenFileWithKate => Some("kate"),
            _ => None,
        }
    }
}

/// Pick the action for a finished run.
///
/// A suffix mapped in the definition's `actions` table wins, with
/// `{install_dir}` substituted; otherwise the default action applies.
pub fn select_action(
    definition: &CommandDefinition,
    action_suffix: Option<&str>,
    install_dir: &Path,
) -> Option<Action> {
    if let Some(identifier) = action_suffix.and_then(|s| definition.actions.get(s)) {
        let install_dir = install_dir.to_string_lossy();
        return Some(Action::parse(&identifier.replace("{install_dir}", &install_dir)));
    }

    definition.default_action.identifier().map(Action::parse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DefaultAction;

    fn definition() -> CommandDefinition {
        let mut def = CommandDefinition::new("ff", vec!["ff".into()], "find");
        def.default_action = DefaultAction::CopyToClipboard;
        def.actions.insert("code".into(), "OpenFileWithVSCode".into());
        def.actions
            .insert("view".into(), "{install_dir}/bin/viewer {SelectedItem}".into());
        def
    }

    #[test]
    fn mapped_suffix_wins_over_default() {
        let action = select_action(&definition(), Some("code"), Path::new("/opt"));
        assert_eq!(action, Some(Action::OpenFileWithVSCode));
    }

    #[test]
    fn unknown_suffix_falls_back_to_default() {
        let action = select_action(&definition(), Some("nope"), Path::new("/opt"));
        assert_eq!(action, Some(Action::CopyToClipboard));
    }

    #[test]
    fn no_suffix_uses_default() {
        assert_eq!(
            select_action(&definition(), None, Path::new("/opt")),
            Some(Action::CopyToClipboard)
        );
    }

    #[test]
    fn default_none_selects_nothing() {
        let mut def = definition();
        def.default_action = DefaultAction::None;
        assert_eq!(select_action(&def, None, Path::new("/opt")), None);
    }

    #[test]
    fn custom_template_gets_install_dir() {
        let action = select_action(&definition(), Some("view"), Path::new("/opt/cr"));
        assert_eq!(
            action,
            Some(Action::Custom("/opt/cr/bin/viewer {SelectedItem}".into()))
        );
    }

    #[test]
    fn legacy_requery_identifier_is_understood() {
        assert_eq!(Action::parse("KRunnerQuery"), Action::Requery);
        assert!(Action::Requery.requires_result());
        assert!(!Action::Custom("x".into()).requires_result());
    }
}
