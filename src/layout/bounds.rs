//! Bounds: A 1-based, inclusive rectangle over buffer rows and columns.

/// A rectangle over the buffer, in 1-based inclusive coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, serde::Deserialize)]
pub struct Bounds {
    /// First row (1-based).
    pub top: usize,
    /// First column (1-based).
    pub left: usize,
    /// Last row (inclusive).
    pub bottom: usize,
    /// Last column (inclusive).
    pub right: usize,
}

impl Bounds {
    /// Create new bounds.
    #[inline]
    pub const fn new(top: usize, left: usize, bottom: usize, right: usize) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    /// Whether the rectangle is 1-based and not inverted.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.top >= 1 && self.left >= 1 && self.bottom >= self.top && self.right >= self.left
    }

    /// Number of rows covered. Open-ended bounds saturate at `usize::MAX`.
    #[inline]
    pub const fn height(&self) -> usize {
        span(self.top, self.bottom)
    }

    /// Number of columns covered.
    #[inline]
    pub const fn width(&self) -> usize {
        span(self.left, self.right)
    }

    /// Cut this rectangle out of `text`.
    ///
    /// Rows and columns past the end of the text are clipped away, so a
    /// region larger than the buffer yields only what exists. Columns count
    /// characters. Lines are joined with `\n`.
    pub fn clip(&self, text: &str) -> String {
        if !self.is_valid() {
            return String::new();
        }

        let mut out = String::new();
        for (i, line) in text
            .split('\n')
            .skip(self.top - 1)
            .take(self.height())
            .enumerate()
        {
            if i > 0 {
                out.push('\n');
            }
            out.extend(line.chars().skip(self.left - 1).take(self.width()));
        }
        out
    }
}

/// Inclusive span length, zero when inverted.
const fn span(first: usize, last: usize) -> usize {
    if last < first {
        0
    } else {
        (last - first).saturating_add(1)
    }
}

impl std::fmt::Debug for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bounds({},{} .. {},{})",
            self.top, self.left, self.bottom, self.right
        )
    }
}
