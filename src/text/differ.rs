//! Diff classifier: Decide how a text snapshot changed since the last one.
//!
//! Terminals redraw in a few recognizable ways:
//! 1. New output is appended below the old (logs, command output)
//! 2. The final line is repainted in place (progress bars, spinners)
//! 3. Everything else is an opaque rewrite (full-screen apps, clears)
//!
//! The classifier only distinguishes these shapes; it never computes an
//! edit script.

/// The shape of a change, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffKind {
    /// First snapshot, no baseline to compare against.
    Initial,
    /// Identical to the baseline.
    Unchanged,
    /// Baseline is a strict prefix of the new text.
    Appended,
    /// Only the final line differs.
    LastLineUpdated,
    /// Any other change.
    Changed,
}

/// Result of comparing a snapshot against the baseline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffResult {
    /// First snapshot.
    Initial,
    /// No change.
    Unchanged,
    /// Text added at the end; carries the new suffix.
    Appended(String),
    /// Final line rewritten; carries the new final line.
    LastLineUpdated(String),
    /// Opaque rewrite.
    Changed,
}

impl DiffResult {
    /// The shape of this result.
    pub const fn kind(&self) -> DiffKind {
        match self {
            Self::Initial => DiffKind::Initial,
            Self::Unchanged => DiffKind::Unchanged,
            Self::Appended(_) => DiffKind::Appended,
            Self::LastLineUpdated(_) => DiffKind::LastLineUpdated,
            Self::Changed => DiffKind::Changed,
        }
    }

    /// The relevant substring (empty for payload-less kinds).
    pub fn payload(&self) -> &str {
        match self {
            Self::Appended(text) | Self::LastLineUpdated(text) => text,
            Self::Initial | Self::Unchanged | Self::Changed => "",
        }
    }

    /// Whether the buffer content differs from the previous baseline.
    pub const fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Appended(_) | Self::LastLineUpdated(_) | Self::Changed
        )
    }
}

/// Stateful classifier comparing each snapshot with the previous one.
#[derive(Debug, Clone, Default)]
pub struct TextDiffer {
    last: Option<String>,
}

impl TextDiffer {
    /// Create a differ with no baseline.
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Classify `new_text` against the baseline, then make it the baseline.
    pub fn update(&mut self, new_text: &str) -> DiffResult {
        let result = match self.last.as_deref() {
            None => DiffResult::Initial,
            Some(old) => classify(old, new_text),
        };

        match &mut self.last {
            Some(last) => {
                last.clear();
                last.push_str(new_text);
            }
            None => self.last = Some(new_text.to_string()),
        }

        result
    }

    /// Drop the baseline so the next update is [`DiffResult::Initial`].
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// The current baseline, if any.
    pub fn last_text(&self) -> Option<&str> {
        self.last.as_deref()
    }
}

fn classify(old: &str, new: &str) -> DiffResult {
    if old == new {
        return DiffResult::Unchanged;
    }

    if let Some(suffix) = new.strip_prefix(old) {
        return DiffResult::Appended(suffix.to_string());
    }

    // Both need a line break: a lone line being replaced is a rewrite
    if let (Some((old_head, old_tail)), Some((new_head, new_tail))) =
        (old.rsplit_once('\n'), new.rsplit_once('\n'))
    {
        if old_head == new_head && old_tail != new_tail {
            return DiffResult::LastLineUpdated(new_tail.to_string());
        }
    }

    DiffResult::Changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn differ_with(baseline: &str) -> TextDiffer {
        let mut d = TextDiffer::new();
        assert_eq!(d.update(baseline), DiffResult::Initial);
        d
    }

    #[test]
    fn test_first_update_is_initial() {
        let mut d = TextDiffer::new();
        let result = d.update("hello");
        assert_eq!(result.kind(), DiffKind::Initial);
        assert_eq!(result.payload(), "");
        assert_eq!(d.last_text(), Some("hello"));
    }

    #[test]
    fn test_unchanged() {
        let mut d = differ_with("a\nb\n");
        let result = d.update("a\nb\n");
        assert_eq!(result.kind(), DiffKind::Unchanged);
        assert_eq!(result.payload(), "");
    }

    #[test]
    fn test_appended_payload_is_suffix() {
        let mut d = differ_with("a\n");
        assert_eq!(d.update("a\nb\n"), DiffResult::Appended("b\n".to_string()));
    }

    #[test]
    fn test_last_line_updated() {
        let mut d = differ_with("x\n|");
        assert_eq!(
            d.update("x\n/"),
            DiffResult::LastLineUpdated("/".to_string())
        );
        // Each repaint carries only the newest line
        assert_eq!(
            d.update("x\n-"),
            DiffResult::LastLineUpdated("-".to_string())
        );
    }

    #[test]
    fn test_single_line_rewrite_is_changed() {
        let mut d = differ_with("foo");
        assert_eq!(d.update("bar"), DiffResult::Changed);
    }

    #[test]
    fn test_earlier_line_change_is_changed() {
        let mut d = differ_with("a\nb\nc");
        assert_eq!(d.update("a\nX\nc"), DiffResult::Changed);
    }

    #[test]
    fn test_removed_trailing_line_is_changed() {
        let mut d = differ_with("a\nb\nc");
        assert_eq!(d.update("a\nb"), DiffResult::Changed);
    }

    #[test]
    fn test_prefix_wins_over_last_line() {
        let mut d = differ_with("x\n50%");
        assert_eq!(d.update("x\n50%!"), DiffResult::Appended("!".to_string()));
    }

    #[test]
    fn test_baseline_updated_after_changed() {
        let mut d = differ_with("one");
        assert_eq!(d.update("two").kind(), DiffKind::Changed);
        assert_eq!(d.update("two\nthree").kind(), DiffKind::Appended);
    }

    #[test]
    fn test_reset_drops_baseline() {
        let mut d = differ_with("line1\n");
        d.reset();
        assert_eq!(d.last_text(), None);
        assert_eq!(d.update("line1\n").kind(), DiffKind::Initial);
    }

    #[test]
    fn test_is_mutation() {
        assert!(!DiffResult::Initial.is_mutation());
        assert!(!DiffResult::Unchanged.is_mutation());
        assert!(DiffResult::Changed.is_mutation());
        assert!(DiffResult::Appended("x".into()).is_mutation());
    }
}
