//! Output sink: The single channel every announcement goes through.

use crate::error::SinkError;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::fmt;

/// Which component produced an utterance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Newly appended buffer output.
    Output,
    /// A change inside a monitored region, by region name.
    Region(String),
    /// The character under a moved cursor.
    Cursor,
    /// Echo of a typed character.
    KeyEcho,
}

/// One piece of text to be spoken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// What to say.
    pub text: String,
    /// Who said it.
    pub origin: Origin,
}

impl Utterance {
    /// Create a new utterance.
    pub fn new(text: impl Into<String>, origin: Origin) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Destination for speech.
///
/// Called from the timer thread, the region worker and the host's
/// foreground context; implementations must not block for long.
pub trait OutputSink: Send + Sync {
    /// Hand one utterance to the speech channel.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the channel cannot take the utterance now.
    fn speak(&self, utterance: Utterance) -> Result<(), SinkError>;
}

/// Speak, logging failures instead of returning them. Never retries.
pub fn speak_best_effort(sink: &dyn OutputSink, utterance: Utterance) {
    if let Err(e) = sink.speak(utterance) {
        log::warn!("speech dropped: {e}");
    }
}

/// An [`OutputSink`] backed by a bounded channel.
///
/// The receiver is drained by whichever context is allowed to talk to the
/// speech engine.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Utterance>,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Utterances buffered before [`SinkError::Busy`] is returned.
    pub fn new(capacity: usize) -> (Self, Receiver<Utterance>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }
}

impl OutputSink for ChannelSink {
    fn speak(&self, utterance: Utterance) -> Result<(), SinkError> {
        self.tx.try_send(utterance).map_err(|e| match e {
            TrySendError::Full(_) => SinkError::Busy,
            TrySendError::Disconnected(_) => SinkError::Closed,
        })
    }
}
