//! Change announcer: Speak new output once the buffer goes quiet.
//!
//! Snapshots are classified by a [`TextDiffer`]. Appended text accumulates,
//! a repainted final line replaces whatever was pending, and the pending
//! text is spoken after `coalesce_ms` without further changes.

use super::sink::{speak_best_effort, OutputSink, Origin, Utterance};
use crate::actor::{SchedulerHandle, TimerSlot};
use crate::config::ConfigHandle;
use crate::position::Generation;
use crate::text::{strip_ansi, DiffKind, DiffResult, TextDiffer};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Default)]
struct State {
    differ: TextDiffer,
    pending: String,
}

/// Coalesces appended output into single announcements.
pub struct ChangeAnnouncer {
    state: Arc<Mutex<State>>,
    sink: Arc<dyn OutputSink>,
    scheduler: SchedulerHandle,
    slot: TimerSlot,
    config: ConfigHandle,
    generation: Generation,
}

impl ChangeAnnouncer {
    /// Create an announcer speaking through `sink`.
    pub fn new(
        sink: Arc<dyn OutputSink>,
        scheduler: SchedulerHandle,
        config: ConfigHandle,
        generation: Generation,
    ) -> Self {
        let slot = scheduler.allocate_slot();
        Self {
            state: Arc::new(Mutex::new(State::default())),
            sink,
            scheduler,
            slot,
            config,
            generation,
        }
    }

    /// Classify a new snapshot and update the pending announcement.
    ///
    /// Any detected change bumps the content generation.
    pub fn feed(&self, snapshot: &str) -> DiffKind {
        let result = {
            let mut state = self.state.lock();
            let result = state.differ.update(snapshot);
            match &result {
                DiffResult::Appended(text) => state.pending.push_str(text),
                DiffResult::LastLineUpdated(line) => state.pending.clone_from(line),
                DiffResult::Initial | DiffResult::Unchanged | DiffResult::Changed => {}
            }
            result
        };

        if result.is_mutation() {
            self.generation.bump();
        }
        if matches!(result.kind(), DiffKind::Appended | DiffKind::LastLineUpdated) {
            self.schedule_flush();
        }
        log::trace!("output: {:?}", result.kind());
        result.kind()
    }

    /// Forget the baseline and discard any pending announcement.
    pub fn reset(&self) {
        self.scheduler.cancel(self.slot);
        let mut state = self.state.lock();
        state.differ.reset();
        state.pending.clear();
    }

    /// Text waiting to be spoken.
    pub fn pending(&self) -> String {
        self.state.lock().pending.clone()
    }

    fn schedule_flush(&self) {
        let state = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);
        let config = self.config.clone();
        let delay = config.get().coalesce_delay();

        self.scheduler.schedule_after(self.slot, delay, move || {
            let text = std::mem::take(&mut state.lock().pending);
            flush(&text, sink.as_ref(), &config);
        });
    }
}

fn flush(text: &str, sink: &dyn OutputSink, config: &ConfigHandle) {
    let config = config.get();
    if config.quiet_mode || !config.announce_new_output {
        log::debug!("output: discarding {} bytes, output announcements off", text.len());
        return;
    }

    let text = if config.strip_ansi {
        strip_ansi(text)
    } else {
        text.into()
    };
    let text = text.trim();
    if text.is_empty() {
        return;
    }

    let lines = text.lines().filter(|line| !line.trim().is_empty()).count();
    let spoken = if lines > config.max_lines_before_summary {
        format!("{lines} new lines")
    } else {
        text.to_string()
    };
    speak_best_effort(sink, Utterance::new(spoken, Origin::Output));
}

impl std::fmt::Debug for ChangeAnnouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeAnnouncer")
            .field("slot", &self.slot)
            .field("pending", &self.state.lock().pending.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Scheduler;
    use crate::config::Config;
    use crate::testing::RecordingSink;
    use std::thread;
    use std::time::Duration;

    const SETTLE: Duration = Duration::from_millis(200);

    fn setup(config: Config) -> (Scheduler, ChangeAnnouncer, Arc<RecordingSink>, Generation) {
        let scheduler = Scheduler::spawn().unwrap();
        let sink = Arc::new(RecordingSink::default());
        let generation = Generation::new();
        let announcer = ChangeAnnouncer::new(
            sink.clone(),
            scheduler.handle(),
            ConfigHandle::new(Config {
                coalesce_ms: 30,
                ..config
            }),
            generation.clone(),
        );
        (scheduler, announcer, sink, generation)
    }

    #[test]
    fn test_appended_output_spoken_once() {
        let (_s, a, sink, _) = setup(Config::default());
        assert_eq!(a.feed("$ ls\n"), DiffKind::Initial);
        assert_eq!(a.feed("$ ls\nfile1\n"), DiffKind::Appended);
        assert_eq!(a.feed("$ ls\nfile1\nfile2\n"), DiffKind::Appended);

        thread::sleep(SETTLE);
        assert_eq!(sink.texts(), vec!["file1\nfile2"]);
        assert!(a.pending().is_empty());
    }

    #[test]
    fn test_three_rapid_appends_coalesce() {
        let (_s, a, sink, _) = setup(Config::default());
        a.feed("base\n");
        a.feed("base\nappend1\n");
        a.feed("base\nappend1\nappend2\n");
        a.feed("base\nappend1\nappend2\nappend3\n");

        thread::sleep(SETTLE);
        assert_eq!(sink.texts(), vec!["append1\nappend2\nappend3"]);
    }

    #[test]
    fn test_nothing_spoken_before_coalesce_delay() {
        let (_s, a, sink, _) = setup(Config::default());
        let a = ChangeAnnouncer {
            config: ConfigHandle::new(Config {
                coalesce_ms: 300,
                ..Config::default()
            }),
            ..a
        };
        a.feed("$ ls\n");
        a.feed("$ ls\nfile1\n");

        thread::sleep(Duration::from_millis(150));
        assert!(sink.texts().is_empty());
        assert_eq!(a.pending(), "file1\n");

        thread::sleep(Duration::from_millis(400));
        assert_eq!(sink.texts(), vec!["file1"]);
    }

    #[test]
    fn test_initial_and_unchanged_are_silent() {
        let (_s, a, sink, generation) = setup(Config::default());
        a.feed("line1\n");
        assert_eq!(a.feed("line1\n"), DiffKind::Unchanged);
        thread::sleep(SETTLE);
        assert!(sink.texts().is_empty());
        assert_eq!(generation.current(), 0);
    }

    #[test]
    fn test_changed_is_silent_but_bumps_generation() {
        let (_s, a, sink, generation) = setup(Config::default());
        a.feed("line1\nline2\n");
        assert_eq!(a.feed("completely different\n"), DiffKind::Changed);
        thread::sleep(SETTLE);
        assert!(sink.texts().is_empty());
        assert_eq!(generation.current(), 1);
    }

    #[test]
    fn test_last_line_update_replaces_pending() {
        let (_s, a, sink, _) = setup(Config::default());
        a.feed("Downloading\n10%");
        assert_eq!(a.feed("Downloading\n20%"), DiffKind::LastLineUpdated);
        assert_eq!(a.feed("Downloading\n30%"), DiffKind::LastLineUpdated);
        assert_eq!(a.pending(), "30%");

        thread::sleep(SETTLE);
        assert_eq!(sink.texts(), vec!["30%"]);
    }

    #[test]
    fn test_long_output_is_summarized() {
        let (_s, a, sink, _) = setup(Config {
            max_lines_before_summary: 5,
            ..Config::default()
        });
        let base = "line0\nline1\nline2\n".to_string();
        a.feed(&base);
        let extra: String = (0..10).map(|i| format!("new{i}\n")).collect();
        a.feed(&(base + &extra));

        thread::sleep(SETTLE);
        assert_eq!(sink.texts(), vec!["10 new lines"]);
    }

    #[test]
    fn test_ansi_stripping_follows_config() {
        let (_s, a, sink, _) = setup(Config::default());
        a.feed("line1\n");
        a.feed("line1\n\x1b[32mgreen line\x1b[0m\n");
        thread::sleep(SETTLE);
        assert_eq!(sink.texts(), vec!["green line"]);

        let (_s, a, sink, _) = setup(Config {
            strip_ansi: false,
            ..Config::default()
        });
        a.feed("line1\n");
        a.feed("line1\n\x1b[32mgreen\x1b[0m\n");
        thread::sleep(SETTLE);
        assert!(sink.texts()[0].contains('\x1b'));
    }

    #[test]
    fn test_quiet_and_disabled_discard() {
        for config in [
            Config {
                quiet_mode: true,
                ..Config::default()
            },
            Config {
                announce_new_output: false,
                ..Config::default()
            },
        ] {
            let (_s, a, sink, _) = setup(config);
            a.feed("line1\n");
            a.feed("line1\nline2\n");
            thread::sleep(SETTLE);
            assert!(sink.texts().is_empty());
            assert!(a.pending().is_empty());
        }
    }

    #[test]
    fn test_whitespace_only_is_skipped() {
        let (_s, a, sink, _) = setup(Config::default());
        a.feed("line1\n");
        a.feed("line1\n   \n\n");
        thread::sleep(SETTLE);
        assert!(sink.texts().is_empty());
    }

    #[test]
    fn test_reset_discards_pending() {
        let (_s, a, sink, _) = setup(Config::default());
        a.feed("a\n");
        a.feed("a\nb\n");
        a.reset();
        assert_eq!(a.feed("a\nb\n"), DiffKind::Initial);

        thread::sleep(SETTLE);
        assert!(sink.texts().is_empty());
    }
}
