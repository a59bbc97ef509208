//! Text module: Snapshot classification and cleanup.
//!
//! This module contains:
//! - [`TextDiffer`]: Stateful classifier for terminal redraw patterns
//! - [`strip_ansi`]: Escape-sequence removal before speech

mod ansi;
mod differ;

pub use ansi::strip_ansi;
pub use differ::{DiffKind, DiffResult, TextDiffer};
