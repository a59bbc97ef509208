//! VT buffer: An emulated terminal screen as a narration source.
//!
//! Raw terminal output (escape sequences included) is fed through `vt100`;
//! positions are screen cells and lines are screen rows.

use super::TextBuffer;
use crate::error::HostError;
use parking_lot::Mutex;
use std::cmp::Ordering;

/// A cell on a [`VtBuffer`] screen (0-based row and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellPosition {
    epoch: u64,
    row: u16,
    col: u16,
}

impl CellPosition {
    /// Screen row (0-based).
    pub const fn row(&self) -> u16 {
        self.row
    }

    /// Screen column (0-based).
    pub const fn col(&self) -> u16 {
        self.col
    }
}

struct Inner {
    parser: vt100::Parser,
    epoch: u64,
}

impl Inner {
    fn pos(&self, row: u16, col: u16) -> CellPosition {
        CellPosition {
            epoch: self.epoch,
            row,
            col,
        }
    }

    fn check(&self, token: &CellPosition) -> Result<(u16, u16), HostError> {
        let (rows, cols) = self.parser.screen().size();
        if token.epoch != self.epoch || token.row >= rows || token.col > cols {
            return Err(HostError::Unresolvable);
        }
        Ok((token.row, token.col))
    }
}

/// A terminal emulator screen implementing [`TextBuffer`].
pub struct VtBuffer {
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for VtBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("VtBuffer")
            .field("size", &inner.parser.screen().size())
            .field("epoch", &inner.epoch)
            .finish_non_exhaustive()
    }
}

impl VtBuffer {
    /// Create an empty screen.
    pub fn new(rows: u16, cols: u16) -> Self {
        Self {
            inner: Mutex::new(Inner {
                parser: vt100::Parser::new(rows, cols, 0),
                epoch: 0,
            }),
        }
    }

    /// Process a chunk of bytes through the terminal emulator.
    pub fn process(&self, data: &[u8]) {
        self.inner.lock().parser.process(data);
    }

    /// Resize the screen. Tokens outside the new size stop resolving.
    pub fn resize(&self, rows: u16, cols: u16) {
        self.inner.lock().parser.set_size(rows, cols);
    }

    /// Recreate the screen; every earlier token goes stale.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        let (rows, cols) = inner.parser.screen().size();
        inner.parser = vt100::Parser::new(rows, cols, 0);
        inner.epoch += 1;
    }

    /// Screen size as `(rows, cols)`.
    pub fn size(&self) -> (u16, u16) {
        self.inner.lock().parser.screen().size()
    }
}

impl TextBuffer for VtBuffer {
    type Token = CellPosition;

    fn snapshot(&self) -> Result<String, HostError> {
        let inner = self.inner.lock();
        let screen = inner.parser.screen();
        let (_, cols) = screen.size();
        let text = screen.rows(0, cols).collect::<Vec<_>>().join("\n");
        Ok(text.trim_end_matches('\n').to_string())
    }

    fn current_position(&self) -> Result<CellPosition, HostError> {
        let inner = self.inner.lock();
        let (row, col) = inner.parser.screen().cursor_position();
        Ok(inner.pos(row, col))
    }

    fn first_position(&self) -> Result<CellPosition, HostError> {
        Ok(self.inner.lock().pos(0, 0))
    }

    fn resolve(&self, token: &CellPosition) -> Result<CellPosition, HostError> {
        self.inner.lock().check(token)?;
        Ok(*token)
    }

    fn compare(&self, a: &CellPosition, b: &CellPosition) -> Result<Ordering, HostError> {
        let inner = self.inner.lock();
        Ok(inner.check(a)?.cmp(&inner.check(b)?))
    }

    fn line_start(&self, token: &CellPosition) -> Result<CellPosition, HostError> {
        let inner = self.inner.lock();
        let (row, _) = inner.check(token)?;
        Ok(inner.pos(row, 0))
    }

    fn advance_lines(&self, token: &mut CellPosition, n: isize) -> Result<isize, HostError> {
        let inner = self.inner.lock();
        let (row, _) = inner.check(token)?;
        let (rows, _) = inner.parser.screen().size();

        let current = i64::from(row);
        let last = i64::from(rows.saturating_sub(1));
        let delta = i64::try_from(n).unwrap_or(if n < 0 { i64::MIN } else { i64::MAX });
        let target = current.saturating_add(delta).clamp(0, last);
        let new_row = u16::try_from(target).unwrap_or(row);

        *token = inner.pos(new_row, 0);
        Ok(isize::try_from(target - current).unwrap_or(0))
    }

    fn advance_chars(&self, token: &mut CellPosition, n: isize) -> Result<isize, HostError> {
        let inner = self.inner.lock();
        let (mut row, mut col) = inner.check(token)?;
        let screen = inner.parser.screen();
        let (rows, cols) = screen.size();
        let mut moved = 0isize;

        while moved != n {
            let next = if n > 0 {
                if col + 1 < cols {
                    Some((row, col + 1))
                } else if row + 1 < rows {
                    Some((row + 1, 0))
                } else {
                    None
                }
            } else if col > 0 {
                Some((row, col - 1))
            } else if row > 0 {
                Some((row - 1, cols.saturating_sub(1)))
            } else {
                None
            };

            let Some((r, c)) = next else { break };
            row = r;
            col = c;
            if screen.cell(row, col).is_some_and(vt100::Cell::is_wide_continuation) {
                continue;
            }
            moved += n.signum();
        }

        *token = inner.pos(row, col);
        Ok(moved)
    }

    fn text_between(&self, start: &CellPosition, end: &CellPosition) -> Result<String, HostError> {
        let inner = self.inner.lock();
        let start = inner.check(start)?;
        let end = inner.check(end)?;
        let screen = inner.parser.screen();
        let (_, cols) = screen.size();

        let mut out = String::new();
        let (mut row, mut col) = start;
        while (row, col) < end {
            if col >= cols {
                if !screen.row_wrapped(row) {
                    out.push('\n');
                }
                row += 1;
                col = 0;
                continue;
            }
            match screen.cell(row, col) {
                Some(cell) if cell.is_wide_continuation() => {}
                Some(cell) if cell.has_contents() => out.push_str(&cell.contents()),
                _ => out.push(' '),
            }
            col += 1;
        }
        Ok(out)
    }

    fn character_at(&self, token: &CellPosition) -> Result<String, HostError> {
        let inner = self.inner.lock();
        let (row, col) = inner.check(token)?;
        Ok(inner
            .parser
            .screen()
            .cell(row, col)
            .map(|cell| cell.contents().to_string())
            .unwrap_or_default())
    }
}
