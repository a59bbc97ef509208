//! Host module: The narrow capability interface onto the live buffer.
//!
//! The buffer belongs to the host. Narration only reads it through
//! [`TextBuffer`], whose positions are opaque tokens that can go stale when
//! the host rebinds its surface. Every primitive is fallible.
//!
//! Two implementations ship with the crate:
//! - [`MemoryBuffer`]: a plain string with a caret, for hosts that hold text
//! - [`VtBuffer`]: a VT100-emulated screen fed with raw terminal output

mod memory;
mod vt;

pub use memory::{MemoryBuffer, MemoryToken};
pub use vt::{CellPosition, VtBuffer};

use crate::error::HostError;
use crate::layout::Bounds;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;

/// Read access to a live text buffer.
///
/// Implementations are shared between the foreground context, the timer
/// thread and the region worker, hence `Send + Sync`.
pub trait TextBuffer: Send + Sync + 'static {
    /// Opaque position handle. Hashable so it can key the position cache.
    type Token: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Full text content, lines separated by `\n`.
    fn snapshot(&self) -> Result<String, HostError>;

    /// Text of a rectangular area, clipped to the buffer.
    fn region_snapshot(&self, bounds: Bounds) -> Result<String, HostError> {
        Ok(bounds.clip(&self.snapshot()?))
    }

    /// Where the cursor is right now.
    fn current_position(&self) -> Result<Self::Token, HostError>;

    /// The first position of the buffer.
    fn first_position(&self) -> Result<Self::Token, HostError>;

    /// Re-derive a live position from a previously stored token.
    fn resolve(&self, token: &Self::Token) -> Result<Self::Token, HostError>;

    /// Relative order of two positions.
    fn compare(&self, a: &Self::Token, b: &Self::Token) -> Result<Ordering, HostError>;

    /// Start of the line containing `token`.
    fn line_start(&self, token: &Self::Token) -> Result<Self::Token, HostError>;

    /// Move `token` to the start of the line `n` lines away (negative moves
    /// up). Returns the signed number of lines actually moved.
    fn advance_lines(&self, token: &mut Self::Token, n: isize) -> Result<isize, HostError>;

    /// Move `token` by `n` characters. Returns the signed number of
    /// characters actually moved.
    fn advance_chars(&self, token: &mut Self::Token, n: isize) -> Result<isize, HostError>;

    /// Text from `start` (inclusive) to `end` (exclusive).
    fn text_between(&self, start: &Self::Token, end: &Self::Token) -> Result<String, HostError>;

    /// The character at `token`; empty at the end of the buffer.
    fn character_at(&self, token: &Self::Token) -> Result<String, HostError> {
        let mut end = token.clone();
        if self.advance_chars(&mut end, 1)? == 0 {
            return Ok(String::new());
        }
        self.text_between(token, &end)
    }
}
