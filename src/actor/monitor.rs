//! Region Monitor Actor: Background polling of named buffer regions.
//!
//! One worker thread wakes every `region_tick_ms`, extracts each due
//! region and feeds the region's own differ. Changes are spoken subject to
//! the region's mode and a per-region minimum interval.
//!
//! ```text
//! ┌──────────────┐   add/remove/enable   ┌───────────────────┐
//! │ Host context │ ────────────────────▶ │ Registrations     │
//! └──────────────┘                       │ (Mutex<Vec<..>>)  │
//!        │ start/stop                    └───────────────────┘
//!        ▼                                         ▲ poll
//! ┌──────────────┐                       ┌───────────────────┐
//! │ stop signal  │ ────────────────────▶ │ Region worker     │ ──▶ OutputSink
//! └──────────────┘                       └───────────────────┘
//! ```

use crate::announce::{speak_best_effort, Origin, OutputSink, Utterance};
use crate::config::ConfigHandle;
use crate::error::MonitorError;
use crate::host::TextBuffer;
use crate::layout::{Bounds, MonitorMode, RegionStatus, Registration};
use crate::text::{strip_ansi, DiffResult};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long `stop` waits for the worker before giving up on it.
const STOP_TIMEOUT: Duration = Duration::from_secs(2);

/// State shared between the monitor and its worker.
struct Shared<B> {
    buffer: Arc<B>,
    sink: Arc<dyn OutputSink>,
    config: ConfigHandle,
    regions: Mutex<Vec<Registration>>,
}

struct Worker {
    thread: JoinHandle<()>,
    stop_tx: Sender<()>,
    done_rx: Receiver<()>,
}

/// Watches named rectangular regions of the buffer for changes.
pub struct RegionMonitor<B: TextBuffer> {
    shared: Arc<Shared<B>>,
    worker: Mutex<Option<Worker>>,
}

impl<B: TextBuffer> RegionMonitor<B> {
    /// Create a stopped monitor with no regions.
    pub fn new(buffer: Arc<B>, sink: Arc<dyn OutputSink>, config: ConfigHandle) -> Self {
        Self {
            shared: Arc::new(Shared {
                buffer,
                sink,
                config,
                regions: Mutex::new(Vec::new()),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Register a region.
    ///
    /// # Arguments
    ///
    /// * `name` - Unique name, also used in announcements.
    /// * `bounds` - 1-based inclusive rectangle.
    /// * `interval` - Poll interval; `None` uses `region_poll_interval_ms`.
    /// * `mode` - Whether changes are spoken.
    pub fn add(
        &self,
        name: impl Into<String>,
        bounds: Bounds,
        interval: Option<Duration>,
        mode: MonitorMode,
    ) -> Result<(), MonitorError> {
        let name = name.into();
        if !bounds.is_valid() {
            return Err(MonitorError::InvalidBounds(bounds));
        }

        let mut regions = self.shared.regions.lock();
        if regions.iter().any(|r| r.name == name) {
            return Err(MonitorError::DuplicateName(name));
        }

        let interval = interval.unwrap_or_else(|| self.shared.config.get().region_poll_interval());
        log::debug!("regions: added `{name}` {bounds:?} every {interval:?} ({mode})");
        regions.push(Registration::new(name, bounds, interval, mode));
        Ok(())
    }

    /// Unregister a region.
    pub fn remove(&self, name: &str) -> Result<(), MonitorError> {
        let mut regions = self.shared.regions.lock();
        let index = regions
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| MonitorError::UnknownRegion(name.to_string()))?;
        regions.remove(index);
        Ok(())
    }

    /// Resume polling a region.
    pub fn enable(&self, name: &str) -> Result<(), MonitorError> {
        self.set_enabled(name, true)
    }

    /// Pause polling a region. Its baseline is kept.
    pub fn disable(&self, name: &str) -> Result<(), MonitorError> {
        self.set_enabled(name, false)
    }

    fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), MonitorError> {
        let mut regions = self.shared.regions.lock();
        let region = regions
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| MonitorError::UnknownRegion(name.to_string()))?;
        region.enabled = enabled;
        Ok(())
    }

    /// Views of every registered region, in registration order.
    pub fn status(&self) -> Vec<RegionStatus> {
        self.shared.regions.lock().iter().map(Registration::status).collect()
    }

    /// Whether the worker thread is alive.
    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|worker| !worker.thread.is_finished())
    }

    /// Spawn the polling worker.
    pub fn start(&self) -> Result<(), MonitorError> {
        let mut worker = self.worker.lock();
        if worker.as_ref().is_some_and(|w| !w.thread.is_finished()) {
            return Err(MonitorError::AlreadyRunning);
        }
        if self.shared.regions.lock().is_empty() {
            return Err(MonitorError::NoRegions);
        }

        let (stop_tx, stop_rx) = bounded(1);
        let (done_tx, done_rx) = bounded(1);
        let shared = Arc::clone(&self.shared);

        let thread = thread::Builder::new()
            .name("narrator-regions".to_string())
            .spawn(move || {
                shared.run_loop(&stop_rx);
                let _ = done_tx.send(());
            })?;

        *worker = Some(Worker {
            thread,
            stop_tx,
            done_rx,
        });
        log::debug!("regions: worker started");
        Ok(())
    }

    /// Stop the worker, waiting for it at most two seconds.
    pub fn stop(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };

        let _ = worker.stop_tx.send(());
        match worker.done_rx.recv_timeout(STOP_TIMEOUT) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                let _ = worker.thread.join();
                log::debug!("regions: worker stopped");
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("regions: worker did not stop within {STOP_TIMEOUT:?}, detaching");
            }
        }
    }
}

impl<B: TextBuffer> Shared<B> {
    /// Main worker loop.
    fn run_loop(&self, stop_rx: &Receiver<()>) {
        loop {
            let tick = self.config.get().region_tick();
            match stop_rx.recv_timeout(tick) {
                Err(RecvTimeoutError::Timeout) => self.poll(Instant::now()),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    /// Poll every due region once and speak what changed.
    fn poll(&self, now: Instant) {
        let config = self.config.get();
        let mut utterances = Vec::new();

        {
            let mut regions = self.regions.lock();
            for region in regions.iter_mut().filter(|r| r.is_due(now)) {
                let text = match self.buffer.region_snapshot(region.bounds) {
                    Ok(text) => text,
                    Err(e) => {
                        log::debug!("regions: `{}` extraction failed: {e}", region.name);
                        region.last_poll = Some(now);
                        continue;
                    }
                };

                let result = region.observe(&text, now);
                if region.mode == MonitorMode::Silent || config.quiet_mode {
                    continue;
                }

                let spoken = match result {
                    DiffResult::Appended(text) | DiffResult::LastLineUpdated(text) if config.strip_ansi => {
                        strip_ansi(&text).trim().to_string()
                    }
                    DiffResult::Appended(text) | DiffResult::LastLineUpdated(text) => text.trim().to_string(),
                    DiffResult::Changed => format!("{} changed", region.name),
                    DiffResult::Initial | DiffResult::Unchanged => continue,
                };
                if spoken.is_empty() {
                    continue;
                }
                if !region.may_announce(now, config.region_min_announce()) {
                    log::trace!("regions: `{}` rate limited", region.name);
                    continue;
                }

                region.last_announcement = Some(now);
                utterances.push(Utterance::new(spoken, Origin::Region(region.name.clone())));
            }
        }

        for utterance in utterances {
            speak_best_effort(self.sink.as_ref(), utterance);
        }
    }
}

impl<B: TextBuffer> Drop for RegionMonitor<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<B: TextBuffer> std::fmt::Debug for RegionMonitor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionMonitor")
            .field("regions", &self.shared.regions.lock().len())
            .field("running", &self.is_running())
            .finish()
    }
}
