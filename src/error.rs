//! Error types, one enum per concern.
//!
//! None of these cross the host's event-delivery path: public entry points
//! called from host notifications log and degrade instead of returning them.

use crate::layout::Bounds;
use std::io;
use thiserror::Error;

/// Failure of a host text-buffer primitive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// No buffer is attached (the surface was torn down).
    #[error("host buffer is not attached")]
    Detached,
    /// A stored token can no longer be re-derived (buffer rebound or compacted).
    #[error("position token can no longer be resolved")]
    Unresolvable,
    /// The buffer changed underneath a query.
    #[error("host buffer is inconsistent: {0}")]
    Inconsistent(String),
}

/// Failure to hand an utterance to the speech channel.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// The speech channel is saturated.
    #[error("output sink is busy")]
    Busy,
    /// The receiving side of the speech channel is gone.
    #[error("output sink is closed")]
    Closed,
}

/// Errors returned by region monitor management calls.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A region with this name is already registered.
    #[error("region `{0}` is already registered")]
    DuplicateName(String),
    /// The bounds are not a valid 1-based rectangle.
    #[error("invalid region bounds {0:?}")]
    InvalidBounds(Bounds),
    /// No region with this name is registered.
    #[error("no region named `{0}`")]
    UnknownRegion(String),
    /// The worker thread is already running.
    #[error("region monitor is already running")]
    AlreadyRunning,
    /// `start` was called with nothing to poll.
    #[error("no regions registered")]
    NoRegions,
    /// The OS refused to spawn the worker thread.
    #[error("failed to spawn region worker: {0}")]
    Spawn(#[from] io::Error),
}

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),
    /// The configuration file is not valid TOML for [`crate::Config`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors while constructing a [`crate::Narrator`].
#[derive(Debug, Error)]
pub enum NarratorError {
    /// The scheduler thread could not be spawned.
    #[error("failed to spawn scheduler: {0}")]
    Spawn(#[from] io::Error),
}
