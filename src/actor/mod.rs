//! Actor Model: Threads and message passing for narration.
//!
//! This module implements the concurrency side of the crate using
//! crossbeam channels:
//! - **Scheduler**: One timer thread running debounced announcement tasks
//! - **Region Monitor**: One worker thread polling registered regions
//! - **Narrator**: Routes host events from the foreground context
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐      HostEvent      ┌──────────────┐  schedule  ┌──────────────┐
//! │ Host context │ ──────────────────▶ │   Narrator   │ ─────────▶ │ Timer Thread │
//! └──────────────┘                     └──────────────┘            └──────────────┘
//!                                             │ start/stop                │
//!                                             ▼                           │ Utterance
//!                                      ┌──────────────┐   Utterance      ▼
//!                                      │Region Worker │ ─────────▶ ┌──────────────┐
//!                                      └──────────────┘            │  OutputSink  │
//!                                                                  └──────────────┘
//! ```

mod messages;
mod monitor;
mod narrator;
mod scheduler;

pub use messages::HostEvent;
pub use monitor::RegionMonitor;
pub use narrator::Narrator;
pub use scheduler::{Scheduler, SchedulerHandle, TimerSlot};
