//! Announce module: Everything that turns buffer activity into speech.
//!
//! This module contains:
//! - [`ChangeAnnouncer`]: Coalesced announcements of new output
//! - [`CursorAnnouncer`]: Debounced character-under-cursor and key echo
//! - [`OutputSink`]: The single speech channel, with [`ChannelSink`]

mod change;
mod cursor;
mod sink;

pub use change::ChangeAnnouncer;
pub use cursor::CursorAnnouncer;
pub use sink::{speak_best_effort, ChannelSink, Origin, OutputSink, Utterance};
