// src/matcher.rs

//! Query matching against trigger words.

use crate::config::DefinitionStore;

/// Relevance of the plain match for a definition.
pub const DEFAULT_RELEVANCE: f32 = 0.8;
/// Relevance of each per-action-suffix match.
pub const ACTION_RELEVANCE: f32 = 0.7;

/// One way to run a definition for a query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatch {
    pub definition_id: String,
    /// The query with the trigger removed, trimmed.
    pub args: String,
    pub action_suffix: Option<String>,
    pub relevance: f32,
}

/// Match `query` against every definition, in store order.
///
/// A trigger `t` matches when the trimmed query equals `t` or starts with
/// `t` followed by a space. Only the first matching trigger of a definition
/// counts. Each matching definition yields its default match followed by
/// one match per action suffix.
pub fn match_query(store: &DefinitionStore, query: &str) -> Vec<QueryMatch> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    for definition in store.definitions() {
        let Some(args) = definition
            .trigger_words
            .iter()
            .find_map(|trigger| strip_trigger(query, trigger))
        else {
            continue;
        };

        matches.push(QueryMatch {
            definition_id: definition.id.clone(),
            args: args.to_string(),
            action_suffix: None,
            relevance: DEFAULT_RELEVANCE,
        });

        for suffix in definition.actions.keys() {
            matches.push(QueryMatch {
                definition_id: definition.id.clone(),
                args: args.to_string(),
                action_suffix: Some(suffix.clone()),
                relevance: ACTION_RELEVANCE,
            });
        }
    }
    matches
}

/// Pick the match to run: the one for `action_suffix` if given, else the
/// first default match. A suffix no definition declares falls back to the
/// default match.
pub fn best_match(matches: &[QueryMatch], action_suffix: Option<&str>) -> Option<QueryMatch> {
    let default = || matches.iter().find(|m| m.action_suffix.is_none());
    let chosen = match action_suffix {
        Some(suffix) => matches
            .iter()
            .find(|m| m.action_suffix.as_deref() == Some(suffix))
            .or_else(default),
        None => default(),
    };
    chosen.cloned()
}

fn strip_trigger<'q>(query: &'q str, trigger: &str) -> Option<&'q str> {
    if query == trigger {
        return Some("");
    }
    query
        .strip_prefix(trigger)
        .and_then(|rest| rest.strip_prefix(' '))
        .map(str::trim)
}
