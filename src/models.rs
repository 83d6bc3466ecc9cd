//! Core data models shared by the connectors, the selection engine, the
//! formatter, and the dispatcher.
//!
//! A [`Review`] is built fresh from vendor data on every run and is never
//! persisted. Every optional attribute is resolved once during
//! normalization, so rendering code never re-derives defaults.

use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigError;

/// The review vendors this tool knows how to poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Store {
    /// Apple App Store customer-review feed (RSS/Atom XML).
    Apple,
    /// Google Play Android Publisher review listing (JSON API).
    Google,
}

impl Store {
    /// Short identifier used on the command line and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Store::Apple => "apple",
            Store::Google => "google",
        }
    }

    /// Human-readable store name used in report notices.
    pub fn label(&self) -> &'static str {
        match self {
            Store::Apple => "Apple App Store",
            Store::Google => "Google Play Store",
        }
    }

    /// Heading used on the first line of each formatted review.
    pub fn review_heading(&self) -> &'static str {
        match self {
            Store::Apple => "iOS App Review",
            Store::Google => "Android App Review",
        }
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which stores a run should poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSelection {
    Apple,
    Google,
    Both,
}

impl StoreSelection {
    pub fn includes(&self, store: Store) -> bool {
        matches!(
            (self, store),
            (StoreSelection::Both, _)
                | (StoreSelection::Apple, Store::Apple)
                | (StoreSelection::Google, Store::Google)
        )
    }

    pub fn stores(&self) -> Vec<Store> {
        [Store::Apple, Store::Google]
            .into_iter()
            .filter(|s| self.includes(*s))
            .collect()
    }
}

impl FromStr for StoreSelection {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apple" => Ok(StoreSelection::Apple),
            "google" => Ok(StoreSelection::Google),
            "both" => Ok(StoreSelection::Both),
            other => Err(ConfigError::InvalidStore(other.to_string())),
        }
    }
}

/// Source-specific review attributes. Absent ones are not rendered, except
/// the vote and thumb counts, which render as 0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewExtra {
    pub app_version: Option<String>,
    pub country: Option<String>,
    /// Apple: helpful votes.
    pub vote_count: Option<u32>,
    /// Apple: total votes cast on the review.
    pub vote_sum: Option<u32>,
    pub thumbs_up: Option<u32>,
    pub thumbs_down: Option<u32>,
    pub language: Option<String>,
    pub device: Option<String>,
    pub os_version: Option<String>,
    pub product_name: Option<String>,
    pub manufacturer: Option<String>,
    pub screen_density_dpi: Option<u32>,
}

/// A normalized, source-agnostic review.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub store: Store,
    /// Vendor timestamp, `None` when the vendor omitted it or sent garbage.
    pub timestamp: Option<DateTime<Utc>>,
    pub rating: Option<u8>,
    /// Apple only.
    pub title: Option<String>,
    pub text: String,
    pub author: String,
    pub identifier: Option<String>,
    pub link: Option<String>,
    pub extra: ReviewExtra,
    /// The raw vendor record, printed in debug mode.
    pub raw_json: Option<serde_json::Value>,
}

impl Review {
    /// The ordering key. A missing timestamp counts as epoch-zero so the
    /// review sorts last.
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or(DateTime::UNIX_EPOCH)
    }
}
