//! Cursor announcer: Speak the character under the cursor after it settles.
//!
//! Also echoes typed keys. With `repeated_symbols` on, a run of the same
//! condensable symbol is held back and spoken as one "N sym" utterance
//! when a different key arrives.

use super::sink::{speak_best_effort, OutputSink, Origin, Utterance};
use crate::actor::{SchedulerHandle, TimerSlot};
use crate::config::ConfigHandle;
use crate::host::TextBuffer;
use crate::position::Generation;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug)]
struct State<T> {
    last_announced: Option<T>,
    last_typed: Option<Instant>,
    repeat: Option<(char, usize)>,
}

impl<T> Default for State<T> {
    fn default() -> Self {
        Self {
            last_announced: None,
            last_typed: None,
            repeat: None,
        }
    }
}

impl<T> State<T> {
    /// Texts to echo now for a typed `ch`.
    fn echo(&mut self, ch: char, condense: bool) -> Vec<String> {
        if let Some((pending, count)) = &mut self.repeat {
            if condense && *pending == ch {
                *count += 1;
                return Vec::new();
            }
        }

        let mut spoken: Vec<String> = self
            .repeat
            .take()
            .map(|(symbol, count)| repeat_text(symbol, count))
            .into_iter()
            .collect();
        if condense {
            self.repeat = Some((ch, 1));
        } else if !ch.is_control() {
            spoken.push(key_name(ch));
        }
        spoken
    }
}

fn key_name(ch: char) -> String {
    if ch == ' ' {
        "space".to_string()
    } else {
        ch.to_string()
    }
}

fn repeat_text(symbol: char, count: usize) -> String {
    if count > 1 {
        format!("{count} {}", key_name(symbol))
    } else {
        key_name(symbol)
    }
}

/// Debounced announcements of the character at the cursor, plus key echo.
pub struct CursorAnnouncer<B: TextBuffer> {
    buffer: Arc<B>,
    state: Arc<Mutex<State<B::Token>>>,
    sink: Arc<dyn OutputSink>,
    scheduler: SchedulerHandle,
    slot: TimerSlot,
    config: ConfigHandle,
    generation: Generation,
}

impl<B: TextBuffer> CursorAnnouncer<B> {
    /// Create an announcer reading from `buffer`.
    pub fn new(
        buffer: Arc<B>,
        sink: Arc<dyn OutputSink>,
        scheduler: SchedulerHandle,
        config: ConfigHandle,
        generation: Generation,
    ) -> Self {
        let slot = scheduler.allocate_slot();
        Self {
            buffer,
            state: Arc::new(Mutex::new(State::default())),
            sink,
            scheduler,
            slot,
            config,
            generation,
        }
    }

    /// The caret moved. Restarts the debounce timer.
    pub fn on_caret_moved(&self) {
        let config = self.config.get();
        if !config.cursor_tracking || config.quiet_mode {
            return;
        }

        let moved_at = Instant::now();
        let buffer = Arc::clone(&self.buffer);
        let state = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);
        let handle = self.config.clone();

        self.scheduler.cancel(self.slot);
        self.scheduler.schedule_after(self.slot, config.cursor_delay(), move || {
            announce(buffer.as_ref(), &state, sink.as_ref(), &handle, moved_at);
        });
    }

    /// A character was typed. Echoes it and marks the content as changed.
    ///
    /// Control characters are not echoed but do end a pending symbol run.
    pub fn on_character_typed(&self, ch: char) {
        let config = self.config.get();
        let spoken = {
            let mut state = self.state.lock();
            state.last_typed = Some(Instant::now());
            if !config.key_echo || config.quiet_mode {
                Vec::new()
            } else {
                let condense = config.repeated_symbols && config.repeated_symbols_values.contains(ch);
                state.echo(ch, condense)
            }
        };
        self.generation.bump();

        for text in spoken {
            speak_best_effort(self.sink.as_ref(), Utterance::new(text, Origin::KeyEcho));
        }
    }

    /// Forget the last announced position and any held symbol run, and
    /// cancel any pending announcement.
    pub fn reset(&self) {
        self.scheduler.cancel(self.slot);
        *self.state.lock() = State::default();
    }
}

fn announce<B: TextBuffer>(
    buffer: &B,
    state: &Mutex<State<B::Token>>,
    sink: &dyn OutputSink,
    config: &ConfigHandle,
    moved_at: Instant,
) {
    let config = config.get();
    if !config.cursor_tracking || config.quiet_mode {
        return;
    }

    let token = match buffer.current_position() {
        Ok(token) => token,
        Err(e) => {
            log::debug!("cursor: no current position: {e}");
            return;
        }
    };

    let mut state = state.lock();
    if state.last_announced.as_ref() == Some(&token) {
        return;
    }

    let character = match buffer.character_at(&token) {
        Ok(character) => character,
        Err(e) => {
            log::debug!("cursor: no character at {token:?}: {e}");
            return;
        }
    };

    let text = match character.as_str() {
        "" | "\n" | "\r" | "\r\n" => {
            let typing = state
                .last_typed
                .is_some_and(|typed| moved_at.saturating_duration_since(typed) <= config.typing_grace());
            if typing {
                return;
            }
            "blank".to_string()
        }
        " " => "space".to_string(),
        "\t" => "tab".to_string(),
        other => other.to_string(),
    };

    state.last_announced = Some(token);
    drop(state);
    speak_best_effort(sink, Utterance::new(text, Origin::Cursor));
}

impl<B: TextBuffer> std::fmt::Debug for CursorAnnouncer<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorAnnouncer")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}
