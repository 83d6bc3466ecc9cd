use anyhow::Result;

use crate::config::Config;

/// Configuration status of one store or delivery target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatus {
    pub name: &'static str,
    pub configured: bool,
    pub healthy: bool,
    pub notes: Option<String>,
}

pub fn get_sources(config: &Config) -> Vec<SourceStatus> {
    let apple = match &config.apple.app_id {
        Some(id) => SourceStatus {
            name: "apple",
            configured: true,
            healthy: true,
            notes: Some(format!("app id {}", id)),
        },
        None => SourceStatus {
            name: "apple",
            configured: false,
            healthy: false,
            notes: Some("set APPLE_ID".to_string()),
        },
    };

    let google = match (&config.google.package_name, &config.google.key_path) {
        (Some(package), Some(key_path)) => {
            let key_exists = key_path.exists();
            SourceStatus {
                name: "google",
                configured: true,
                healthy: key_exists,
                notes: Some(if key_exists {
                    package.clone()
                } else {
                    format!("key file not found: {}", key_path.display())
                }),
            }
        }
        (None, _) => SourceStatus {
            name: "google",
            configured: false,
            healthy: false,
            notes: Some("set GOOGLE_PLAY_PACKAGE_NAME".to_string()),
        },
        (Some(_), None) => SourceStatus {
            name: "google",
            configured: false,
            healthy: false,
            notes: Some("set GOOGLE_PLAY_JSON_KEY_PATH".to_string()),
        },
    };

    let slack = match (&config.slack.token, &config.slack.channel) {
        (Some(_), Some(channel)) => SourceStatus {
            name: "slack",
            configured: true,
            healthy: true,
            notes: Some(channel.clone()),
        },
        _ => SourceStatus {
            name: "slack",
            configured: false,
            healthy: false,
            notes: Some("set SLACK_BOT_TOKEN and SLACK_CHANNEL".to_string()),
        },
    };

    vec![apple, google, slack]
}

pub fn list_sources(config: &Config) -> Result<()> {
    println!("{:<16} {:<16} {:<8} NOTES", "SOURCE", "STATUS", "HEALTHY");
    for source in get_sources(config) {
        let status = if source.configured {
            "OK"
        } else {
            "NOT CONFIGURED"
        };
        println!(
            "{:<16} {:<16} {:<8} {}",
            source.name,
            status,
            source.healthy,
            source.notes.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
