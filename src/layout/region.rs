//! Region registrations: named rectangles watched by the region monitor.

use super::bounds::Bounds;
use crate::text::{DiffResult, TextDiffer};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// What a region does with the changes it detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorMode {
    /// Speak changes, rate limited per region.
    #[default]
    Changes,
    /// Track changes without ever speaking.
    Silent,
}

impl FromStr for MonitorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "changes" => Ok(Self::Changes),
            "silent" => Ok(Self::Silent),
            other => Err(format!("unknown monitor mode `{other}`")),
        }
    }
}

impl fmt::Display for MonitorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Changes => "changes",
            Self::Silent => "silent",
        })
    }
}

/// A watched region with its own diff baseline.
#[derive(Debug)]
pub struct Registration {
    /// Unique name.
    pub name: String,
    /// Area of the buffer to extract.
    pub bounds: Bounds,
    /// Minimum time between polls.
    pub interval: Duration,
    /// Announcement policy.
    pub mode: MonitorMode,
    /// Whether the poll loop visits this region.
    pub enabled: bool,
    /// When the region was last polled.
    pub last_poll: Option<Instant>,
    /// When the region last spoke.
    pub last_announcement: Option<Instant>,
    differ: TextDiffer,
}

impl Registration {
    /// Create a new, enabled registration that has never been polled.
    pub fn new(name: String, bounds: Bounds, interval: Duration, mode: MonitorMode) -> Self {
        Self {
            name,
            bounds,
            interval,
            mode,
            enabled: true,
            last_poll: None,
            last_announcement: None,
            differ: TextDiffer::new(),
        }
    }

    /// Whether the region should be polled at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        self.enabled
            && self
                .last_poll
                .is_none_or(|last| now.saturating_duration_since(last) >= self.interval)
    }

    /// Whether the per-region rate limiter allows speaking at `now`.
    pub fn may_announce(&self, now: Instant, min_interval: Duration) -> bool {
        self.last_announcement
            .is_none_or(|last| now.saturating_duration_since(last) >= min_interval)
    }

    /// Feed freshly extracted text into this region's differ.
    pub fn observe(&mut self, text: &str, now: Instant) -> DiffResult {
        self.last_poll = Some(now);
        self.differ.update(text)
    }

    /// Read-only view for status reporting.
    pub fn status(&self) -> RegionStatus {
        RegionStatus {
            name: self.name.clone(),
            bounds: self.bounds,
            interval: self.interval,
            mode: self.mode,
            enabled: self.enabled,
            last_poll: self.last_poll,
        }
    }
}

/// Snapshot of a registration, returned by `RegionMonitor::status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionStatus {
    /// Unique name.
    pub name: String,
    /// Watched area.
    pub bounds: Bounds,
    /// Poll interval.
    pub interval: Duration,
    /// Announcement policy.
    pub mode: MonitorMode,
    /// Whether polling is enabled.
    pub enabled: bool,
    /// Last poll time, if any.
    pub last_poll: Option<Instant>,
}
