//! # Scrollback Narrator
//!
//! Live cursor position and change narration for terminal scrollback.
//!
//! The narrator sits between a host that owns a text buffer (a terminal
//! emulator, a console window, a log pane) and a speech channel. It
//! answers "where is the cursor" cheaply and turns buffer activity into
//! short, non-redundant utterances.
//!
//! ## Core Concepts
//!
//! - **Position resolution**: Opaque host tokens become 1-based rows and
//!   columns through a TTL cache, an incremental walk and a full walk
//! - **Diff classification**: Snapshots are sorted into appended output,
//!   repainted last lines and opaque rewrites
//! - **Debounced speech**: New output, cursor moves and region changes are
//!   coalesced on one timer thread before reaching the [`OutputSink`]
//! - **Region monitoring**: Named rectangles polled in the background
//!
//! ```text
//! ┌──────────────┐  HostEvent  ┌──────────────┐ calculate ┌──────────────────┐
//! │     Host     │ ──────────▶ │   Narrator   │ ────────▶ │ PositionResolver │
//! └──────────────┘             └──────────────┘           └──────────────────┘
//!        ▲ TextBuffer                 │ feed / caret              │
//!        │                            ▼                           ▼
//!        │                     ┌──────────────┐           ┌──────────────────┐
//!        └──────────────────── │  Announcers  │           │  PositionCache   │
//!                              └──────────────┘           └──────────────────┘
//!                                     │ Utterance
//!                                     ▼
//!                              ┌──────────────┐
//!                              │  OutputSink  │
//!                              └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use narrator::{ChannelSink, ConfigHandle, HostEvent, MemoryBuffer, Narrator};
//! use std::sync::Arc;
//!
//! let buffer = Arc::new(MemoryBuffer::new("prompt> "));
//! let (sink, speech) = ChannelSink::new(64);
//! let narrator = Narrator::new(buffer.clone(), ConfigHandle::default(), Arc::new(sink))?;
//!
//! buffer.append("\nhello");
//! narrator.handle_event(HostEvent::ContentChanged);
//! assert_eq!(narrator.describe_position(), "row 2, column 6");
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actor;
pub mod announce;
pub mod config;
pub mod error;
pub mod host;
pub mod layout;
pub mod position;
pub mod text;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use actor::{HostEvent, Narrator, RegionMonitor, Scheduler, SchedulerHandle, TimerSlot};
pub use announce::{ChangeAnnouncer, ChannelSink, CursorAnnouncer, Origin, OutputSink, Utterance};
pub use config::{Config, ConfigHandle};
pub use error::{ConfigError, HostError, MonitorError, NarratorError, SinkError};
pub use host::{CellPosition, MemoryBuffer, MemoryToken, TextBuffer, VtBuffer};
pub use layout::{Bounds, MonitorMode, RegionStatus};
pub use position::{Generation, Position, PositionCache, PositionResolver};
pub use text::{strip_ansi, DiffKind, DiffResult, TextDiffer};
