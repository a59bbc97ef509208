//! Position resolver: Token → 1-based (row, col) with as little walking as possible.
//!
//! Resolution goes through three tiers:
//!
//! ```text
//! calculate(token)
//!     │
//!     ├─ cache hit (fresh, current generation) ──────────────▶ (row, col)
//!     │
//!     ├─ incremental: walk ≤ N lines from the last position ─▶ (row, col)
//!     │
//!     └─ full walk from the first position ──────────────────▶ (row, col)
//!                                                   any failure ─▶ (0, 0)
//! ```

use super::{Generation, PositionCache};
use crate::config::ConfigHandle;
use crate::error::HostError;
use crate::host::TextBuffer;
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

/// A 1-based row and column. `(0, 0)` means the position is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Line number, starting at 1.
    pub row: usize,
    /// Column number, starting at 1.
    pub col: usize,
}

impl Position {
    /// Sentinel returned when a position cannot be determined.
    pub const UNAVAILABLE: Self = Self { row: 0, col: 0 };

    /// Create a new position.
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Whether this is a real position rather than the sentinel.
    pub const fn is_available(&self) -> bool {
        self.row != 0 || self.col != 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_available() {
            write!(f, "row {}, column {}", self.row, self.col)
        } else {
            f.write_str("position unavailable")
        }
    }
}

/// The most recent successful resolution.
#[derive(Debug)]
struct LastKnown<T> {
    token: T,
    row: usize,
    generation: u64,
}

/// Maps host position tokens to row and column numbers.
pub struct PositionResolver<B: TextBuffer> {
    buffer: Arc<B>,
    cache: PositionCache<B::Token>,
    last_known: Mutex<Option<LastKnown<B::Token>>>,
    generation: Generation,
    config: ConfigHandle,
}

impl<B: TextBuffer> PositionResolver<B> {
    /// Create a resolver over `buffer`.
    ///
    /// Cache TTL and capacity are read from `config` once, here.
    pub fn new(buffer: Arc<B>, config: ConfigHandle, generation: Generation) -> Self {
        let current = config.get();
        let cache = PositionCache::new(current.cache_ttl(), current.cache_max_entries, generation.clone());
        Self {
            buffer,
            cache,
            last_known: Mutex::new(None),
            generation,
            config,
        }
    }

    /// Resolve `token` to a 1-based position.
    ///
    /// Never fails: returns [`Position::UNAVAILABLE`] when the buffer is
    /// detached, the token no longer resolves, or the host reports an error.
    pub fn calculate(&self, token: &B::Token) -> Position {
        if let Some((row, col)) = self.cache.get(token) {
            return Position::new(row, col);
        }

        let generation = self.generation.current();
        let computed = self.incremental(token, generation).or_else(|| {
            self.full_walk(token)
                .map_err(|e| log::debug!("position: full walk failed: {e}"))
                .ok()
        });

        let Some(position) = computed else {
            return Position::UNAVAILABLE;
        };

        self.cache
            .set_at_generation(token.clone(), position.row, position.col, generation);
        *self.last_known.lock() = Some(LastKnown {
            token: token.clone(),
            row: position.row,
            generation,
        });
        position
    }

    /// Drop every cached position and the last known position.
    pub fn clear(&self) {
        self.cache.clear();
        *self.last_known.lock() = None;
    }

    /// Drop the cached position of a single token.
    pub fn invalidate(&self, token: &B::Token) {
        self.cache.invalidate(token);
    }

    /// The underlying cache.
    pub const fn cache(&self) -> &PositionCache<B::Token> {
        &self.cache
    }

    /// The buffer being resolved against.
    pub const fn buffer(&self) -> &Arc<B> {
        &self.buffer
    }

    fn incremental(&self, target: &B::Token, generation: u64) -> Option<Position> {
        let (prev, prev_row) = {
            let last = self.last_known.lock();
            let last = last.as_ref().filter(|l| l.generation == generation)?;
            (last.token.clone(), last.row)
        };

        match self.walk_from(&prev, prev_row, target) {
            Ok(position) => position,
            Err(e) => {
                log::debug!("position: incremental walk abandoned: {e}");
                None
            }
        }
    }

    /// Walk line by line from a known position. `Ok(None)` when the target
    /// is further away than the incremental threshold.
    fn walk_from(&self, prev: &B::Token, prev_row: usize, target: &B::Token) -> Result<Option<Position>, HostError> {
        let buffer = &*self.buffer;
        let threshold = self.config.get().incremental_line_threshold;

        let prev = buffer.resolve(prev)?;
        let target = buffer.resolve(target)?;
        let mut line = buffer.line_start(&prev)?;
        let mut row = prev_row;
        let mut steps = 0;

        if buffer.compare(&prev, &target)? == Ordering::Greater {
            while buffer.compare(&line, &target)? == Ordering::Greater {
                if steps == threshold || row <= 1 {
                    return Ok(None);
                }
                if buffer.advance_lines(&mut line, -1)? == 0 {
                    return Err(HostError::Inconsistent("no line above a later position".into()));
                }
                row -= 1;
                steps += 1;
            }
        } else {
            loop {
                let mut next = line.clone();
                if buffer.advance_lines(&mut next, 1)? == 0 || buffer.compare(&next, &target)? == Ordering::Greater {
                    break;
                }
                if steps == threshold {
                    return Ok(None);
                }
                line = next;
                row += 1;
                steps += 1;
            }
        }

        let col = self.column(&line, &target)?;
        Ok(Some(Position::new(row, col)))
    }

    fn full_walk(&self, target: &B::Token) -> Result<Position, HostError> {
        let buffer = &*self.buffer;
        let target = buffer.resolve(target)?;
        let mut line = buffer.first_position()?;
        let mut row = 1;

        loop {
            let mut next = line.clone();
            if buffer.advance_lines(&mut next, 1)? == 0 || buffer.compare(&next, &target)? == Ordering::Greater {
                break;
            }
            line = next;
            row += 1;
        }

        let col = self.column(&line, &target)?;
        Ok(Position::new(row, col))
    }

    fn column(&self, line_start: &B::Token, target: &B::Token) -> Result<usize, HostError> {
        let text = self.buffer.text_between(line_start, target)?;
        Ok(text.graphemes(true).count() + 1)
    }
}

impl<B: TextBuffer> fmt::Debug for PositionResolver<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionResolver")
            .field("cached", &self.cache.len())
            .field("generation", &self.generation.current())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{MemoryBuffer, MemoryToken};
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    /// Wraps a [`MemoryBuffer`] and counts walk primitives.
    #[derive(Default)]
    struct CountingBuffer {
        inner: MemoryBuffer,
        line_steps: AtomicUsize,
        first_calls: AtomicUsize,
    }

    impl CountingBuffer {
        fn new(text: &str) -> Self {
            Self {
                inner: MemoryBuffer::new(text),
                ..Self::default()
            }
        }

        fn line_steps(&self) -> usize {
            self.line_steps.load(AtomicOrdering::SeqCst)
        }

        fn first_calls(&self) -> usize {
            self.first_calls.load(AtomicOrdering::SeqCst)
        }
    }

    impl TextBuffer for CountingBuffer {
        type Token = MemoryToken;

        fn snapshot(&self) -> Result<String, HostError> {
            self.inner.snapshot()
        }
        fn current_position(&self) -> Result<MemoryToken, HostError> {
            self.inner.current_position()
        }
        fn first_position(&self) -> Result<MemoryToken, HostError> {
            self.first_calls.fetch_add(1, AtomicOrdering::SeqCst);
            self.inner.first_position()
        }
        fn resolve(&self, token: &MemoryToken) -> Result<MemoryToken, HostError> {
            self.inner.resolve(token)
        }
        fn compare(&self, a: &MemoryToken, b: &MemoryToken) -> Result<Ordering, HostError> {
            self.inner.compare(a, b)
        }
        fn line_start(&self, token: &MemoryToken) -> Result<MemoryToken, HostError> {
            self.inner.line_start(token)
        }
        fn advance_lines(&self, token: &mut MemoryToken, n: isize) -> Result<isize, HostError> {
            self.line_steps.fetch_add(1, AtomicOrdering::SeqCst);
            self.inner.advance_lines(token, n)
        }
        fn advance_chars(&self, token: &mut MemoryToken, n: isize) -> Result<isize, HostError> {
            self.inner.advance_chars(token, n)
        }
        fn text_between(&self, start: &MemoryToken, end: &MemoryToken) -> Result<String, HostError> {
            self.inner.text_between(start, end)
        }
    }

    fn numbered_lines(count: usize) -> String {
        (1..=count).map(|i| format!("line {i}\n")).collect()
    }

    /// Character offset of the start of line `n` in [`numbered_lines`] text.
    fn line_offset(text: &str, n: usize) -> usize {
        text.find(&format!("line {n}\n")).unwrap()
    }

    fn resolver<B: TextBuffer>(buffer: &Arc<B>) -> PositionResolver<B> {
        PositionResolver::new(Arc::clone(buffer), ConfigHandle::default(), Generation::new())
    }

    #[test]
    fn test_prompt_end_is_column_nine() {
        let buf = Arc::new(MemoryBuffer::new("prompt> "));
        let r = resolver(&buf);
        assert_eq!(r.calculate(&buf.token_at(8)), Position::new(1, 9));
    }

    #[test]
    fn test_multiline_position() {
        let buf = Arc::new(MemoryBuffer::new("ab\ncd\nef"));
        let r = resolver(&buf);
        assert_eq!(r.calculate(&buf.token_at(0)), Position::new(1, 1));
        assert_eq!(r.calculate(&buf.token_at(4)), Position::new(2, 2));
        assert_eq!(r.calculate(&buf.token_at(8)), Position::new(3, 3));
    }

    #[test]
    fn test_cache_hit_skips_walk() {
        let buf = Arc::new(CountingBuffer::new(&numbered_lines(30)));
        let r = resolver(&buf);
        let token = buf.inner.token_at(line_offset(&buf.inner.text(), 15) + 2);

        let first = r.calculate(&token);
        let steps = buf.line_steps();
        let second = r.calculate(&token);

        assert_eq!(first, Position::new(15, 3));
        assert_eq!(second, first);
        assert_eq!(buf.line_steps(), steps);
    }

    #[test]
    fn test_incremental_forward() {
        let buf = Arc::new(CountingBuffer::new(&numbered_lines(30)));
        let text = buf.inner.text();
        let r = resolver(&buf);

        assert_eq!(r.calculate(&buf.inner.token_at(line_offset(&text, 20))), Position::new(20, 1));
        let steps = buf.line_steps();

        let pos = r.calculate(&buf.inner.token_at(line_offset(&text, 23) + 4));
        assert_eq!(pos, Position::new(23, 5));
        assert_eq!(buf.first_calls(), 1);
        assert!(buf.line_steps() - steps <= 4);
    }

    #[test]
    fn test_incremental_backward() {
        let buf = Arc::new(CountingBuffer::new(&numbered_lines(30)));
        let text = buf.inner.text();
        let r = resolver(&buf);

        r.calculate(&buf.inner.token_at(line_offset(&text, 20) + 3));
        let pos = r.calculate(&buf.inner.token_at(line_offset(&text, 15) + 1));
        assert_eq!(pos, Position::new(15, 2));
        assert_eq!(buf.first_calls(), 1);
    }

    #[test]
    fn test_far_jump_uses_full_walk() {
        let buf = Arc::new(CountingBuffer::new(&numbered_lines(40)));
        let text = buf.inner.text();
        let r = resolver(&buf);

        r.calculate(&buf.inner.token_at(line_offset(&text, 2)));
        let pos = r.calculate(&buf.inner.token_at(line_offset(&text, 35)));
        assert_eq!(pos, Position::new(35, 1));
        assert_eq!(buf.first_calls(), 2);
    }

    #[test]
    fn test_generation_bump_recomputes() {
        let buf = Arc::new(MemoryBuffer::new("abc"));
        let generation = Generation::new();
        let r = PositionResolver::new(Arc::clone(&buf), ConfigHandle::default(), generation.clone());
        let token = buf.token_at(2);

        assert_eq!(r.calculate(&token), Position::new(1, 3));
        buf.set_text("x\nabc");
        assert_eq!(r.calculate(&token), Position::new(1, 3));

        generation.bump();
        assert_eq!(r.calculate(&token), Position::new(2, 1));
    }

    #[test]
    fn test_stale_token_is_unavailable() {
        let buf = Arc::new(MemoryBuffer::new("hello"));
        let r = resolver(&buf);
        let token = buf.token_at(3);
        buf.rebind("hello");
        r.clear();
        assert_eq!(r.calculate(&token), Position::UNAVAILABLE);
    }

    #[test]
    fn test_detached_is_unavailable() {
        let buf = Arc::new(MemoryBuffer::new("hello"));
        let r = resolver(&buf);
        let token = buf.token_at(1);
        buf.detach();
        assert_eq!(r.calculate(&token), Position::UNAVAILABLE);
    }

    #[test]
    fn test_vt_screen_position() {
        let buf = Arc::new(crate::host::VtBuffer::new(5, 40));
        buf.process(b"first\r\nprompt> ");
        let r = resolver(&buf);
        let token = buf.current_position().unwrap();
        assert_eq!(r.calculate(&token), Position::new(2, 9));
    }

    #[test]
    fn test_display() {
        assert_eq!(Position::new(3, 7).to_string(), "row 3, column 7");
        assert_eq!(Position::UNAVAILABLE.to_string(), "position unavailable");
    }
}
