//! In-memory buffer: A string with a caret, shared behind a lock.

use super::TextBuffer;
use crate::error::HostError;
use parking_lot::RwLock;
use std::cmp::Ordering;
use unicode_segmentation::UnicodeSegmentation;

/// Position in a [`MemoryBuffer`].
///
/// Carries the epoch of the content it was issued for, so tokens from
/// before a [`MemoryBuffer::rebind`] no longer resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemoryToken {
    epoch: u64,
    /// Byte offset, always on a character boundary.
    offset: usize,
}

#[derive(Debug)]
struct Inner {
    text: String,
    caret: usize,
    epoch: u64,
    attached: bool,
}

impl Inner {
    fn token(&self, offset: usize) -> MemoryToken {
        MemoryToken {
            epoch: self.epoch,
            offset,
        }
    }

    fn check(&self, token: &MemoryToken) -> Result<usize, HostError> {
        if !self.attached {
            return Err(HostError::Detached);
        }
        if token.epoch != self.epoch
            || token.offset > self.text.len()
            || !self.text.is_char_boundary(token.offset)
        {
            return Err(HostError::Unresolvable);
        }
        Ok(token.offset)
    }

    fn attached(&self) -> Result<(), HostError> {
        if self.attached {
            Ok(())
        } else {
            Err(HostError::Detached)
        }
    }

    fn line_start(&self, offset: usize) -> usize {
        self.text[..offset].rfind('\n').map_or(0, |i| i + 1)
    }

    fn byte_offset(&self, char_offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_offset)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn clamp_caret(&mut self) {
        let mut caret = self.caret.min(self.text.len());
        while !self.text.is_char_boundary(caret) {
            caret -= 1;
        }
        self.caret = caret;
    }
}

/// A thread-safe string buffer implementing [`TextBuffer`].
///
/// Lines are separated by `\n`. Character steps move over whole grapheme
/// clusters so the caret never lands inside a combined character.
#[derive(Debug)]
pub struct MemoryBuffer {
    inner: RwLock<Inner>,
}

impl Default for MemoryBuffer {
    fn default() -> Self {
        Self::new("")
    }
}

impl MemoryBuffer {
    /// Create a buffer with the caret at the end of `text`.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            inner: RwLock::new(Inner {
                caret: text.len(),
                text,
                epoch: 0,
                attached: true,
            }),
        }
    }

    /// Replace the content. Existing tokens stay resolvable where their
    /// offsets still exist.
    pub fn set_text(&self, text: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.text = text.into();
        inner.clamp_caret();
    }

    /// Append text at the end, moving the caret to the new end.
    pub fn append(&self, text: &str) {
        let mut inner = self.inner.write();
        inner.text.push_str(text);
        inner.caret = inner.text.len();
    }

    /// Replace the content as a new surface; every earlier token goes stale.
    pub fn rebind(&self, text: impl Into<String>) {
        let mut inner = self.inner.write();
        inner.text = text.into();
        inner.caret = inner.text.len();
        inner.epoch += 1;
        inner.attached = true;
    }

    /// Tear the surface down; every query fails until [`Self::rebind`].
    pub fn detach(&self) {
        self.inner.write().attached = false;
    }

    /// Move the caret to a character offset (clamped to the end).
    pub fn set_caret(&self, char_offset: usize) {
        let mut inner = self.inner.write();
        inner.caret = inner.byte_offset(char_offset);
    }

    /// Token for a character offset (clamped to the end).
    pub fn token_at(&self, char_offset: usize) -> MemoryToken {
        let inner = self.inner.read();
        inner.token(inner.byte_offset(char_offset))
    }

    /// Current content.
    pub fn text(&self) -> String {
        self.inner.read().text.clone()
    }
}

impl TextBuffer for MemoryBuffer {
    type Token = MemoryToken;

    fn snapshot(&self) -> Result<String, HostError> {
        let inner = self.inner.read();
        inner.attached()?;
        Ok(inner.text.clone())
    }

    fn current_position(&self) -> Result<MemoryToken, HostError> {
        let inner = self.inner.read();
        inner.attached()?;
        Ok(inner.token(inner.caret))
    }

    fn first_position(&self) -> Result<MemoryToken, HostError> {
        let inner = self.inner.read();
        inner.attached()?;
        Ok(inner.token(0))
    }

    fn resolve(&self, token: &MemoryToken) -> Result<MemoryToken, HostError> {
        let inner = self.inner.read();
        inner.check(token)?;
        Ok(*token)
    }

    fn compare(&self, a: &MemoryToken, b: &MemoryToken) -> Result<Ordering, HostError> {
        let inner = self.inner.read();
        Ok(inner.check(a)?.cmp(&inner.check(b)?))
    }

    fn line_start(&self, token: &MemoryToken) -> Result<MemoryToken, HostError> {
        let inner = self.inner.read();
        let offset = inner.check(token)?;
        Ok(inner.token(inner.line_start(offset)))
    }

    fn advance_lines(&self, token: &mut MemoryToken, n: isize) -> Result<isize, HostError> {
        let inner = self.inner.read();
        let mut offset = inner.line_start(inner.check(token)?);
        let mut moved = 0isize;

        while moved < n {
            match inner.text[offset..].find('\n') {
                Some(i) => offset += i + 1,
                None => break,
            }
            moved += 1;
        }
        while moved > n {
            if offset == 0 {
                break;
            }
            offset = inner.line_start(offset - 1);
            moved -= 1;
        }

        *token = inner.token(offset);
        Ok(moved)
    }

    fn advance_chars(&self, token: &mut MemoryToken, n: isize) -> Result<isize, HostError> {
        let inner = self.inner.read();
        let offset = inner.check(token)?;
        let steps = n.unsigned_abs();

        let (moved, new_offset) = if n >= 0 {
            let ahead = &inner.text[offset..];
            let bytes: usize = ahead.graphemes(true).take(steps).map(str::len).sum();
            let count = ahead[..bytes].graphemes(true).count();
            (isize::try_from(count).unwrap_or(isize::MAX), offset + bytes)
        } else {
            let behind = &inner.text[..offset];
            let bytes: usize = behind.graphemes(true).rev().take(steps).map(str::len).sum();
            let count = behind[offset - bytes..].graphemes(true).count();
            (-isize::try_from(count).unwrap_or(isize::MAX), offset - bytes)
        };

        *token = inner.token(new_offset);
        Ok(moved)
    }

    fn text_between(&self, start: &MemoryToken, end: &MemoryToken) -> Result<String, HostError> {
        let inner = self.inner.read();
        let start = inner.check(start)?;
        let end = inner.check(end)?;
        if start >= end {
            return Ok(String::new());
        }
        Ok(inner.text[start..end].to_string())
    }
}
