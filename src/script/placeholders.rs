// src/script/placeholders.rs

//! `{query}`, `{output_file}`, `{temp_script}` and `{install_dir}`
//! substitution.
//!
//! Substitution is a single left-to-right pass over the template, so text
//! coming from a substituted value is never scanned for placeholders again.
//! Any other `{...}` sequence (for example `awk '{print $1}'`) is left as is.

use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::quote::quote_for_shell;

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(query|output_file|temp_script|install_dir)\}")
        .expect("placeholder pattern is valid")
});

/// How substituted values are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    /// Values (except `{install_dir}`) are shell-quoted; used for text handed
    /// to `sh`.
    Shell,
    /// Values are inserted as is; used for argv tokens that never reach a
    /// shell.
    Raw,
}

/// Values available for substitution.
#[derive(Debug, Clone, Copy)]
pub struct Placeholders<'a> {
    pub query: &'a str,
    pub output_file: Option<&'a Path>,
    pub temp_script: Option<&'a Path>,
    pub install_dir: &'a Path,
}

impl Placeholders<'_> {
    /// Replace every known placeholder in `template`.
    ///
    /// `{output_file}` and `{temp_script}` are left untouched when no path is
    /// available for them.
    pub fn substitute(&self, template: &str, quoting: Quoting) -> String {
        PLACEHOLDER_RE
            .replace_all(template, |caps: &Captures<'_>| {
                let literal = &caps[0];
                let value: Option<Cow<'_, str>> = match &caps[1] {
                    "query" => Some(Cow::Borrowed(self.query)),
                    "output_file" => self.output_file.map(|p| p.to_string_lossy()),
                    "temp_script" => self.temp_script.map(|p| p.to_string_lossy()),
                    "install_dir" => {
                        return self.install_dir.to_string_lossy().into_owned();
                    }
                    _ => None,
                };

                match (value, quoting) {
                    (Some(v), Quoting::Shell) => quote_for_shell(&v),
                    (Some(v), Quoting::Raw) => v.into_owned(),
                    (None, _) => literal.to_string(),
                }
            })
            .into_owned()
    }
}

/// The template with every known placeholder removed.
///
/// Used to decide whether the template itself, independent of user input,
/// needs a shell.
pub fn mask(template: &str) -> String {
    PLACEHOLDER_RE.replace_all(template, "").into_owned()
}
