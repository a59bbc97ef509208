//! Message types delivered by the host.
//!
//! These are the notifications the host's foreground context forwards to
//! the [`Narrator`](super::Narrator).

/// A notification from the host about the live buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// The caret moved.
    CaretMoved,
    /// The user typed a character.
    CharacterTyped(char),
    /// The buffer content may have changed; take a new snapshot.
    ContentChanged,
    /// The host replaced its surface; earlier positions are meaningless.
    Rebound,
}
