//! Test helpers shared by the unit test modules.

use crate::announce::{OutputSink, Origin, Utterance};
use crate::error::SinkError;
use parking_lot::Mutex;

/// An [`OutputSink`] that records everything it is asked to speak.
#[derive(Debug, Default)]
pub struct RecordingSink {
    spoken: Mutex<Vec<Utterance>>,
}

impl RecordingSink {
    pub fn texts(&self) -> Vec<String> {
        self.spoken.lock().iter().map(|u| u.text.clone()).collect()
    }

    pub fn origins(&self) -> Vec<Origin> {
        self.spoken.lock().iter().map(|u| u.origin.clone()).collect()
    }
}

impl OutputSink for RecordingSink {
    fn speak(&self, utterance: Utterance) -> Result<(), SinkError> {
        self.spoken.lock().push(utterance);
        Ok(())
    }
}
