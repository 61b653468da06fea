// src/result/mod.rs

//! Result extraction and follow-up actions.
//!
//! - [`extractor`] turns a finished child's stdout or result file into a
//!   clean result value and validates path results.
//! - [`actions`] parses action identifiers and picks the action to run.
//! - [`custom`] expands and launches custom action templates.
//! - [`host`] is the seam to the desktop: opening paths, the clipboard,
//!   requery, launching programs.
//! - [`dispatcher`] ties the steps together for one finished child.

pub mod actions;
pub mod custom;
pub mod dispatcher;
pub mod extractor;
pub mod host;

pub use actions::{select_action, Action};
pub use dispatcher::{ProcessOutcome, ResultDispatcher};
pub use host::{ActionHost, ClipboardOwners, DesktopHost};
