//! Persisted last-run watermark.
//!
//! The watermark is a single instant stored as integer epoch-seconds in a
//! small text file. It marks the boundary between reviews that were already
//! delivered and reviews that are new. Reading never fails: a missing,
//! unreadable, or corrupt file means "no watermark" (epoch-zero). Writing
//! failures are logged and swallowed so the run still completes.
//!
//! RFC 3339 values (as written by older tooling) are accepted on read and
//! rewritten as epoch-seconds on the next save.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

/// How the next watermark is chosen at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkStrategy {
    /// Time the run started, captured before fetching.
    #[default]
    Now,
    /// Newest delivered review timestamp, never moving backwards.
    MaxSeen,
}

impl WatermarkStrategy {
    /// Compute the watermark to persist after a run.
    pub fn next(
        &self,
        previous: DateTime<Utc>,
        newest_delivered: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        match self {
            WatermarkStrategy::Now => now,
            WatermarkStrategy::MaxSeen => newest_delivered.map_or(previous, |n| n.max(previous)),
        }
    }
}

impl FromStr for WatermarkStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "now" => Ok(WatermarkStrategy::Now),
            "max_seen" => Ok(WatermarkStrategy::MaxSeen),
            _ => Err(ConfigError::InvalidStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for WatermarkStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatermarkStrategy::Now => f.write_str("now"),
            WatermarkStrategy::MaxSeen => f.write_str("max_seen"),
        }
    }
}

/// Parse a stored watermark value: epoch-seconds or an RFC 3339 instant.
pub fn parse_watermark(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// File-backed watermark store. No locking: concurrent runs race and the
/// last writer wins.
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted watermark, or `None` if there is no usable value.
    pub fn read(&self) -> Option<DateTime<Utc>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    path = %self.path.display(),
                    "no watermark file found, treating this as the first run"
                );
                return None;
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to read watermark file, ignoring it"
                );
                return None;
            }
        };

        let parsed = parse_watermark(&content);
        if parsed.is_none() {
            warn!(
                path = %self.path.display(),
                content = %content.trim().chars().take(64).collect::<String>(),
                "watermark file does not contain a valid timestamp, ignoring it"
            );
        }
        parsed
    }

    /// Load the watermark, falling back to epoch-zero.
    pub fn load(&self) -> DateTime<Utc> {
        let watermark = self.read().unwrap_or(DateTime::UNIX_EPOCH);
        debug!(watermark = %watermark.to_rfc3339(), "loaded watermark");
        watermark
    }

    /// Overwrite the persisted watermark. Returns whether the value was
    /// written; failures are logged, never raised.
    pub fn save(&self, at: DateTime<Utc>) -> bool {
        match self.write(at) {
            Ok(()) => {
                info!(
                    path = %self.path.display(),
                    watermark = at.timestamp(),
                    "watermark updated"
                );
                true
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to save watermark"
                );
                false
            }
        }
    }

    fn write(&self, at: DateTime<Utc>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, format!("{}\n", at.timestamp()))
    }

    /// Delete the watermark file. Returns `false` if there was nothing to delete.
    pub fn reset(&self) -> io::Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
