//! Narrator: Main coordinator that ties the components together.
//!
//! The Narrator is the entry point for hosts. It owns the timer thread,
//! the region monitor and both announcers, and routes [`HostEvent`]s from
//! the host's foreground context to them.

use super::messages::HostEvent;
use super::{RegionMonitor, Scheduler};
use crate::announce::{ChangeAnnouncer, CursorAnnouncer, OutputSink};
use crate::config::ConfigHandle;
use crate::error::NarratorError;
use crate::host::TextBuffer;
use crate::position::{Generation, Position, PositionResolver};
use std::sync::Arc;

/// Narration engine over one host buffer.
pub struct Narrator<B: TextBuffer> {
    buffer: Arc<B>,
    config: ConfigHandle,
    generation: Generation,
    resolver: PositionResolver<B>,
    output: ChangeAnnouncer,
    cursor: CursorAnnouncer<B>,
    regions: RegionMonitor<B>,
    /// Dropped last so pending tasks never outlive their owners' state.
    _scheduler: Scheduler,
}

impl<B: TextBuffer> Narrator<B> {
    /// Create a narrator speaking through `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer thread cannot be spawned.
    pub fn new(buffer: Arc<B>, config: ConfigHandle, sink: Arc<dyn OutputSink>) -> Result<Self, NarratorError> {
        let scheduler = Scheduler::spawn()?;
        let generation = Generation::new();

        let resolver = PositionResolver::new(Arc::clone(&buffer), config.clone(), generation.clone());
        let output = ChangeAnnouncer::new(
            Arc::clone(&sink),
            scheduler.handle(),
            config.clone(),
            generation.clone(),
        );
        let cursor = CursorAnnouncer::new(
            Arc::clone(&buffer),
            Arc::clone(&sink),
            scheduler.handle(),
            config.clone(),
            generation.clone(),
        );
        let regions = RegionMonitor::new(Arc::clone(&buffer), sink, config.clone());

        Ok(Self {
            buffer,
            config,
            generation,
            resolver,
            output,
            cursor,
            regions,
            _scheduler: scheduler,
        })
    }

    /// Route one host notification. Never fails; problems are logged.
    pub fn handle_event(&self, event: HostEvent) {
        log::trace!("event: {event:?}");
        match event {
            HostEvent::CaretMoved => self.cursor.on_caret_moved(),
            HostEvent::CharacterTyped(ch) => self.cursor.on_character_typed(ch),
            HostEvent::ContentChanged => match self.buffer.snapshot() {
                Ok(text) => {
                    self.output.feed(&text);
                }
                Err(e) => log::debug!("event: snapshot failed: {e}"),
            },
            HostEvent::Rebound => {
                self.resolver.clear();
                self.output.reset();
                self.cursor.reset();
                self.generation.bump();
            }
        }
    }

    /// Row and column of the cursor, or [`Position::UNAVAILABLE`].
    pub fn position(&self) -> Position {
        match self.buffer.current_position() {
            Ok(token) => self.resolver.calculate(&token),
            Err(e) => {
                log::debug!("position: no current position: {e}");
                Position::UNAVAILABLE
            }
        }
    }

    /// Spoken form of [`Self::position`].
    pub fn describe_position(&self) -> String {
        self.position().to_string()
    }

    /// The region monitor.
    pub const fn regions(&self) -> &RegionMonitor<B> {
        &self.regions
    }

    /// The live configuration handle.
    pub const fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// The position resolver.
    pub const fn resolver(&self) -> &PositionResolver<B> {
        &self.resolver
    }

    /// The output announcer.
    pub const fn output(&self) -> &ChangeAnnouncer {
        &self.output
    }

    /// The shared content generation.
    pub const fn generation(&self) -> &Generation {
        &self.generation
    }

    /// The host buffer.
    pub const fn buffer(&self) -> &Arc<B> {
        &self.buffer
    }
}

impl<B: TextBuffer> Drop for Narrator<B> {
    fn drop(&mut self) {
        self.regions.stop();
    }
}

impl<B: TextBuffer> std::fmt::Debug for Narrator<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Narrator")
            .field("generation", &self.generation.current())
            .field("regions", &self.regions)
            .finish_non_exhaustive()
    }
}
