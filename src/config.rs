//! Configuration: One explicit settings object, shared with live reload.
//!
//! Components never cache settings; they read the current [`Config`]
//! through a [`ConfigHandle`] at each decision, so a reload takes effect
//! on the next event. Cache geometry (TTL, capacity) is the exception and
//! applies when the resolver is constructed.

use crate::error::ConfigError;
use arc_swap::ArcSwap;
use serde::Deserialize;
use std::ops::RangeInclusive;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Settings for every narration component.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long a cached position stays valid.
    pub cache_ttl_ms: u64,
    /// Maximum number of cached positions.
    pub cache_max_entries: usize,
    /// Maximum line distance walked incrementally from the last position.
    pub incremental_line_threshold: usize,

    /// Announce newly appended output.
    pub announce_new_output: bool,
    /// Quiet period before pending output is spoken.
    pub coalesce_ms: u64,
    /// Above this many lines, output is summarized as "N new lines".
    pub max_lines_before_summary: usize,
    /// Strip ANSI escape sequences before speaking output.
    pub strip_ansi: bool,

    /// Poll interval for regions added without one.
    pub region_poll_interval_ms: u64,
    /// Minimum time between two announcements of the same region.
    pub region_min_announce_ms: u64,
    /// Wake-up period of the region worker.
    pub region_tick_ms: u64,

    /// Announce the character under the cursor when it moves.
    pub cursor_tracking: bool,
    /// Debounce delay for cursor announcements.
    pub cursor_delay_ms: u64,
    /// A blank cursor position this soon after typing is not announced.
    pub typing_grace_ms: u64,
    /// Speak typed characters.
    pub key_echo: bool,
    /// Condense runs of a repeated symbol in key echo into "N sym".
    pub repeated_symbols: bool,
    /// Symbols that are condensed when repeated.
    pub repeated_symbols_values: String,

    /// Suppress all speech.
    pub quiet_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_ms: 1000,
            cache_max_entries: 100,
            incremental_line_threshold: 10,
            announce_new_output: true,
            coalesce_ms: 200,
            max_lines_before_summary: 20,
            strip_ansi: true,
            region_poll_interval_ms: 500,
            region_min_announce_ms: 2000,
            region_tick_ms: 100,
            cursor_tracking: true,
            cursor_delay_ms: 20,
            typing_grace_ms: 500,
            key_echo: true,
            repeated_symbols: false,
            repeated_symbols_values: "-_=!".to_string(),
            quiet_mode: false,
        }
    }
}

/// Replace an out-of-range value with its default.
fn checked<T>(name: &str, value: T, range: RangeInclusive<T>, default: T) -> T
where
    T: PartialOrd + Copy + std::fmt::Debug,
{
    if range.contains(&value) {
        value
    } else {
        log::warn!("config: {name}={value:?} outside {range:?}, using {default:?}");
        default
    }
}

impl Config {
    /// Parse a TOML document. Missing keys take their defaults; the result
    /// is validated.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        Ok(config.validated())
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Return a copy where every out-of-range value is replaced by its default.
    #[must_use]
    pub fn validated(self) -> Self {
        let d = Self::default();
        Self {
            cache_ttl_ms: checked("cache_ttl_ms", self.cache_ttl_ms, 1..=60_000, d.cache_ttl_ms),
            cache_max_entries: checked(
                "cache_max_entries",
                self.cache_max_entries,
                1..=10_000,
                d.cache_max_entries,
            ),
            incremental_line_threshold: checked(
                "incremental_line_threshold",
                self.incremental_line_threshold,
                1..=1000,
                d.incremental_line_threshold,
            ),
            coalesce_ms: checked("coalesce_ms", self.coalesce_ms, 50..=2000, d.coalesce_ms),
            max_lines_before_summary: checked(
                "max_lines_before_summary",
                self.max_lines_before_summary,
                1..=200,
                d.max_lines_before_summary,
            ),
            region_poll_interval_ms: checked(
                "region_poll_interval_ms",
                self.region_poll_interval_ms,
                10..=60_000,
                d.region_poll_interval_ms,
            ),
            region_min_announce_ms: checked(
                "region_min_announce_ms",
                self.region_min_announce_ms,
                0..=60_000,
                d.region_min_announce_ms,
            ),
            region_tick_ms: checked("region_tick_ms", self.region_tick_ms, 10..=1000, d.region_tick_ms),
            cursor_delay_ms: checked("cursor_delay_ms", self.cursor_delay_ms, 0..=1000, d.cursor_delay_ms),
            typing_grace_ms: checked("typing_grace_ms", self.typing_grace_ms, 0..=5000, d.typing_grace_ms),
            ..self
        }
    }

    /// Position cache time-to-live.
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Output coalescing delay.
    pub const fn coalesce_delay(&self) -> Duration {
        Duration::from_millis(self.coalesce_ms)
    }

    /// Default region poll interval.
    pub const fn region_poll_interval(&self) -> Duration {
        Duration::from_millis(self.region_poll_interval_ms)
    }

    /// Per-region minimum announcement interval.
    pub const fn region_min_announce(&self) -> Duration {
        Duration::from_millis(self.region_min_announce_ms)
    }

    /// Region worker tick.
    pub const fn region_tick(&self) -> Duration {
        Duration::from_millis(self.region_tick_ms)
    }

    /// Cursor debounce delay.
    pub const fn cursor_delay(&self) -> Duration {
        Duration::from_millis(self.cursor_delay_ms)
    }

    /// Typing grace window.
    pub const fn typing_grace(&self) -> Duration {
        Duration::from_millis(self.typing_grace_ms)
    }
}

/// Shared, live-reloadable handle to the current [`Config`].
///
/// Cloning the handle shares the same settings. Reads are lock-free.
#[derive(Debug, Clone)]
pub struct ConfigHandle {
    inner: Arc<ArcSwap<Config>>,
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ConfigHandle {
    /// Wrap a configuration. The value is stored as given; use
    /// [`ConfigHandle::store`] to go through validation.
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Current settings.
    pub fn get(&self) -> Arc<Config> {
        self.inner.load_full()
    }

    /// Validate and publish new settings.
    pub fn store(&self, config: Config) {
        self.inner.store(Arc::new(config.validated()));
    }

    /// Modify the current settings in place.
    pub fn update(&self, f: impl FnOnce(&mut Config)) {
        let mut next = Config::clone(&self.get());
        f(&mut next);
        self.store(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.cache_ttl(), Duration::from_millis(1000));
        assert_eq!(c.cache_max_entries, 100);
        assert_eq!(c.incremental_line_threshold, 10);
        assert_eq!(c.coalesce_delay(), Duration::from_millis(200));
        assert_eq!(c.max_lines_before_summary, 20);
        assert_eq!(c.region_min_announce(), Duration::from_secs(2));
        assert_eq!(c.cursor_delay(), Duration::from_millis(20));
        assert_eq!(c.typing_grace(), Duration::from_millis(500));
        assert!(c.strip_ansi);
        assert!(!c.quiet_mode);
        assert!(!c.repeated_symbols);
        assert_eq!(c.repeated_symbols_values, "-_=!");
    }

    #[test]
    fn test_validation_falls_back_to_defaults() {
        let c = Config {
            coalesce_ms: 10,
            max_lines_before_summary: 999,
            cursor_delay_ms: 5000,
            ..Config::default()
        }
        .validated();
        assert_eq!(c.coalesce_ms, 200);
        assert_eq!(c.max_lines_before_summary, 20);
        assert_eq!(c.cursor_delay_ms, 20);
    }

    #[test]
    fn test_validation_keeps_boundaries() {
        let c = Config {
            coalesce_ms: 50,
            max_lines_before_summary: 200,
            cursor_delay_ms: 0,
            ..Config::default()
        }
        .validated();
        assert_eq!(c.coalesce_ms, 50);
        assert_eq!(c.max_lines_before_summary, 200);
        assert_eq!(c.cursor_delay_ms, 0);
    }

    #[test]
    fn test_from_toml_partial() {
        let c = Config::from_toml_str("quiet_mode = true\ncoalesce_ms = 300\n").unwrap();
        assert!(c.quiet_mode);
        assert_eq!(c.coalesce_ms, 300);
        assert_eq!(c.cache_max_entries, 100);

        let c = Config::from_toml_str("repeated_symbols = true\nrepeated_symbols_values = \"#*\"\n").unwrap();
        assert!(c.repeated_symbols);
        assert_eq!(c.repeated_symbols_values, "#*");
    }

    #[test]
    fn test_from_toml_rejects_wrong_type() {
        assert!(matches!(
            Config::from_toml_str("coalesce_ms = \"fast\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "key_echo = false").unwrap();
        let c = Config::load(file.path()).unwrap();
        assert!(!c.key_echo);

        assert!(matches!(
            Config::load("/nonexistent/narrator.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_handle_update_is_shared() {
        let handle = ConfigHandle::default();
        let other = handle.clone();
        handle.update(|c| c.quiet_mode = true);
        assert!(other.get().quiet_mode);
    }

    #[test]
    fn test_handle_store_validates() {
        let handle = ConfigHandle::default();
        handle.store(Config {
            cache_max_entries: 0,
            ..Config::default()
        });
        assert_eq!(handle.get().cache_max_entries, 100);
    }
}
