//! Configuration loading.
//!
//! Settings come from a TOML file (every section optional) and are then
//! overridden by environment variables, which is where credentials and
//! store identifiers normally live:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `SLACK_BOT_TOKEN` | `slack.token` |
//! | `SLACK_CHANNEL` | `slack.channel` |
//! | `APPLE_ID` | `apple.app_id` |
//! | `GOOGLE_PLAY_PACKAGE_NAME` | `google.package_name` |
//! | `GOOGLE_PLAY_JSON_KEY_PATH` | `google.key_path` |
//!
//! ```toml
//! [watermark]
//! path = "lastRunTimestamp.txt"
//! strategy = "now"            # or "max_seen"
//!
//! [display]
//! time_zone = "America/Los_Angeles"
//!
//! [apple]
//! app_id = "1234567890"
//! app_name = "iOS Example App"
//!
//! [google]
//! package_name = "com.example.app"
//! key_path = "service-account.json"
//! ```

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::ConfigError;
use crate::models::{Store, StoreSelection};
use crate::watermark::WatermarkStrategy;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub watermark: WatermarkConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub apple: AppleConfig,
    #[serde(default)]
    pub google: GoogleConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WatermarkConfig {
    #[serde(default = "default_watermark_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub strategy: WatermarkStrategy,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            path: default_watermark_path(),
            strategy: WatermarkStrategy::default(),
        }
    }
}

fn default_watermark_path() -> PathBuf {
    PathBuf::from("lastRunTimestamp.txt")
}

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time_zone: default_time_zone(),
        }
    }
}

fn default_time_zone() -> String {
    "America/Los_Angeles".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlackConfig {
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_slack_api_base")]
    pub api_base: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            channel: None,
            token: None,
            api_base: default_slack_api_base(),
        }
    }
}

fn default_slack_api_base() -> String {
    "https://slack.com".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppleConfig {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default = "default_apple_app_name")]
    pub app_name: String,
    #[serde(default = "default_apple_feed_base")]
    pub feed_base: String,
}

impl Default for AppleConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_name: default_apple_app_name(),
            feed_base: default_apple_feed_base(),
        }
    }
}

fn default_apple_app_name() -> String {
    "iOS App".to_string()
}
fn default_apple_feed_base() -> String {
    "https://itunes.apple.com".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GoogleConfig {
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default = "default_google_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    #[serde(default = "default_google_api_base")]
    pub api_base: String,
    /// Overrides the `token_uri` from the service-account key.
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            package_name: None,
            app_name: default_google_app_name(),
            key_path: None,
            api_base: default_google_api_base(),
            token_uri: None,
        }
    }
}

fn default_google_app_name() -> String {
    "Android App".to_string()
}
fn default_google_api_base() -> String {
    "https://androidpublisher.googleapis.com".to_string()
}

impl Config {
    /// Parse the configured display time zone.
    pub fn time_zone(&self) -> Result<Tz, ConfigError> {
        self.display
            .time_zone
            .parse::<Tz>()
            .map_err(|_| ConfigError::TimeZone(self.display.time_zone.clone()))
    }

    /// Whether the given store has everything it needs to be polled.
    pub fn store_configured(&self, store: Store) -> bool {
        match store {
            Store::Apple => self.apple.app_id.is_some(),
            Store::Google => self.google.package_name.is_some() && self.google.key_path.is_some(),
        }
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SLACK_BOT_TOKEN") {
            self.slack.token = Some(v);
        }
        if let Some(v) = get("SLACK_CHANNEL") {
            self.slack.channel = Some(v);
        }
        if let Some(v) = get("APPLE_ID") {
            self.apple.app_id = Some(v);
        }
        if let Some(v) = get("GOOGLE_PLAY_PACKAGE_NAME") {
            self.google.package_name = Some(v);
        }
        if let Some(v) = get("GOOGLE_PLAY_JSON_KEY_PATH") {
            self.google.key_path = Some(PathBuf::from(v));
        }
    }

    /// Check that everything a run needs is present. Called before any fetch.
    pub fn validate_for_run(
        &self,
        stores: StoreSelection,
        send_to_webhook: bool,
    ) -> Result<(), ConfigError> {
        if stores.includes(Store::Apple) && self.apple.app_id.is_none() {
            return Err(ConfigError::Missing {
                what: "Apple app id",
                env: "APPLE_ID",
                section: "apple",
            });
        }
        if stores.includes(Store::Google) {
            if self.google.package_name.is_none() {
                return Err(ConfigError::Missing {
                    what: "Google Play package name",
                    env: "GOOGLE_PLAY_PACKAGE_NAME",
                    section: "google",
                });
            }
            if self.google.key_path.is_none() {
                return Err(ConfigError::Missing {
                    what: "Google Play service-account key",
                    env: "GOOGLE_PLAY_JSON_KEY_PATH",
                    section: "google",
                });
            }
        }
        if send_to_webhook {
            if self.slack.token.is_none() {
                return Err(ConfigError::Missing {
                    what: "Slack bot token",
                    env: "SLACK_BOT_TOKEN",
                    section: "slack",
                });
            }
            if self.slack.channel.is_none() {
                return Err(ConfigError::Missing {
                    what: "Slack channel",
                    env: "SLACK_CHANNEL",
                    section: "slack",
                });
            }
        }
        Ok(())
    }
}

/// Parse and validate a TOML config string. No environment overrides.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.http.timeout_secs == 0 {
        anyhow::bail!("http.timeout_secs must be > 0");
    }

    config.time_zone()?;

    Ok(config)
}

/// Load configuration from `path` (if it exists) and the process environment.
///
/// A missing config file is not an error: built-in defaults are used and the
/// environment supplies credentials. A `.env` file in the working directory
/// is loaded first.
pub fn load_config(path: &Path) -> Result<Config> {
    dotenvy::dotenv().ok();

    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        debug!(path = %path.display(), "config file not found, using defaults");
        Config::default()
    };

    config.apply_env_with(|key| std::env::var(key).ok());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.watermark.path, PathBuf::from("lastRunTimestamp.txt"));
        assert_eq!(config.watermark.strategy, WatermarkStrategy::Now);
        assert_eq!(config.display.time_zone, "America/Los_Angeles");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.slack.api_base, "https://slack.com");
        assert!(config.apple.app_id.is_none());
        assert_eq!(config.time_zone().unwrap(), chrono_tz::America::Los_Angeles);
    }

    #[test]
    fn full_config_parses() {
        let config = parse_config(
            r##"
[watermark]
path = "state/watermark"
strategy = "max_seen"

[display]
time_zone = "Europe/Berlin"

[slack]
channel = "#reviews"

[apple]
app_id = "123"
app_name = "iOS Sports"

[google]
package_name = "com.example.sports"
key_path = "key.json"
"##,
        )
        .unwrap();
        assert_eq!(config.watermark.strategy, WatermarkStrategy::MaxSeen);
        assert_eq!(config.time_zone().unwrap(), chrono_tz::Europe::Berlin);
        assert_eq!(config.slack.channel.as_deref(), Some("#reviews"));
        assert_eq!(config.apple.app_name, "iOS Sports");
        assert!(config.store_configured(Store::Apple));
        assert!(config.store_configured(Store::Google));
    }

    #[test]
    fn unknown_time_zone_rejected() {
        let err = parse_config("[display]\ntime_zone = \"Mars/Olympus\"").unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(parse_config("[http]\ntimeout_secs = 0").is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = parse_config("[slack]\nchannel = \"#file\"").unwrap();
        let env: HashMap<&str, &str> = [
            ("SLACK_CHANNEL", "#env"),
            ("SLACK_BOT_TOKEN", "xoxb-1"),
            ("APPLE_ID", "999"),
            ("GOOGLE_PLAY_PACKAGE_NAME", ""),
        ]
        .into_iter()
        .collect();
        config.apply_env_with(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.slack.channel.as_deref(), Some("#env"));
        assert_eq!(config.slack.token.as_deref(), Some("xoxb-1"));
        assert_eq!(config.apple.app_id.as_deref(), Some("999"));
        // Blank values do not override.
        assert!(config.google.package_name.is_none());
    }

    #[test]
    fn validation_requires_selected_store_settings() {
        let config = Config::default();
        assert!(matches!(
            config.validate_for_run(StoreSelection::Apple, false),
            Err(ConfigError::Missing { env: "APPLE_ID", .. })
        ));
        assert!(matches!(
            config.validate_for_run(StoreSelection::Google, false),
            Err(ConfigError::Missing {
                env: "GOOGLE_PLAY_PACKAGE_NAME",
                ..
            })
        ));
    }

    #[test]
    fn validation_requires_slack_only_when_delivering() {
        let mut config = Config::default();
        config.apple.app_id = Some("1".into());
        assert!(config.validate_for_run(StoreSelection::Apple, false).is_ok());
        assert!(matches!(
            config.validate_for_run(StoreSelection::Apple, true),
            Err(ConfigError::Missing {
                env: "SLACK_BOT_TOKEN",
                ..
            })
        ));
        config.slack.token = Some("t".into());
        config.slack.channel = Some("#c".into());
        assert!(config.validate_for_run(StoreSelection::Apple, true).is_ok());
    }
}
