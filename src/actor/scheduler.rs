//! Scheduler Actor: Dedicated timer thread for debounced announcements.
//!
//! Every debounced behavior in the crate follows the same pattern: cancel
//! whatever is pending, then schedule again. Components own a
//! [`TimerSlot`]; scheduling into a slot replaces its pending task.
//!
//! ```text
//! ┌──────────────┐   Schedule/Cancel   ┌──────────────────┐
//! │ Announcers   │ ──────────────────▶ │  Timer Thread    │
//! └──────────────┘                     │  (runs due tasks │
//!                                      │   one at a time) │
//!                                      └──────────────────┘
//! ```

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::collections::HashMap;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Identifies one debounced activity. At most one task is pending per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerSlot(u64);

enum Command {
    Schedule {
        slot: TimerSlot,
        deadline: Instant,
        task: Task,
    },
    Cancel(TimerSlot),
    Shutdown,
}

/// Cloneable handle for scheduling work on a [`Scheduler`]'s timer thread.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: Sender<Command>,
    next_slot: Arc<AtomicU64>,
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("slots", &self.next_slot.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl SchedulerHandle {
    /// Reserve a new slot.
    pub fn allocate_slot(&self) -> TimerSlot {
        TimerSlot(self.next_slot.fetch_add(1, Ordering::Relaxed))
    }

    /// Run `task` after `delay`, replacing any task pending in `slot`.
    pub fn schedule_after(&self, slot: TimerSlot, delay: Duration, task: impl FnOnce() + Send + 'static) {
        let command = Command::Schedule {
            slot,
            deadline: Instant::now() + delay,
            task: Box::new(task),
        };
        if self.tx.send(command).is_err() {
            log::debug!("scheduler: timer thread gone, dropping task for {slot:?}");
        }
    }

    /// Drop the task pending in `slot`, if any. A task that already ran is
    /// unaffected.
    pub fn cancel(&self, slot: TimerSlot) {
        let _ = self.tx.send(Command::Cancel(slot));
    }
}

/// Owns the timer thread. Dropping it discards pending tasks and joins.
pub struct Scheduler {
    handle: SchedulerHandle,
    thread: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn the timer thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS fails to spawn the thread.
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = unbounded();

        let thread = thread::Builder::new()
            .name("narrator-timer".to_string())
            .spawn(move || Self::run_loop(&rx))?;

        Ok(Self {
            handle: SchedulerHandle {
                tx,
                next_slot: Arc::new(AtomicU64::new(0)),
            },
            thread: Some(thread),
        })
    }

    /// A handle for scheduling from other components.
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Main timer loop.
    fn run_loop(rx: &Receiver<Command>) {
        let mut pending: HashMap<TimerSlot, (Instant, Task)> = HashMap::new();

        loop {
            let next_deadline = pending.values().map(|(deadline, _)| *deadline).min();
            let received = match next_deadline {
                Some(deadline) => rx.recv_deadline(deadline),
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };

            match received {
                Ok(Command::Schedule { slot, deadline, task }) => {
                    pending.insert(slot, (deadline, task));
                }
                Ok(Command::Cancel(slot)) => {
                    pending.remove(&slot);
                }
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }

            let now = Instant::now();
            let mut due: Vec<(TimerSlot, Instant)> = pending
                .iter()
                .filter(|(_, (deadline, _))| *deadline <= now)
                .map(|(slot, (deadline, _))| (*slot, *deadline))
                .collect();
            due.sort_by_key(|(_, deadline)| *deadline);

            for (slot, _) in due {
                if let Some((_, task)) = pending.remove(&slot) {
                    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                        log::error!("scheduler: task in {slot:?} panicked");
                    }
                }
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let _ = self.handle.tx.send(Command::Shutdown);
        if let Some(thread) = self.thread.take() {
            // A task that drops the last owner runs on the timer thread itself.
            if thread.thread().id() != thread::current().id() {
                let _ = thread.join();
            }
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("running", &self.thread.is_some())
            .finish_non_exhaustive()
    }
}
