use httpmock::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const ENV_VARS: [&str; 6] = [
    "SLACK_BOT_TOKEN",
    "SLACK_CHANNEL",
    "APPLE_ID",
    "GOOGLE_PLAY_PACKAGE_NAME",
    "GOOGLE_PLAY_JSON_KEY_PATH",
    "RUST_LOG",
];

const FEED: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns:im="http://itunes.apple.com/rss" xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <updated>2024-03-05T14:07:00-07:00</updated>
    <id>10883236327</id>
    <title>Great app</title>
    <content type="text">Works well.</content>
    <im:voteSum>3</im:voteSum>
    <im:voteCount>2</im:voteCount>
    <im:rating>5</im:rating>
    <im:version>3.2.1</im:version>
    <author><name>sporty_fan</name></author>
  </entry>
  <entry>
    <updated>2024-03-04T09:00:00-07:00</updated>
    <id>10883236000</id>
    <title>Meh</title>
    <content type="text">Crashes sometimes.</content>
    <im:rating>2</im:rating>
    <author><name>critic</name></author>
  </entry>
</feed>"#;

fn revwatch_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_revwatch"))
}

fn setup_test_env(extra_config: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[watermark]
path = "{}/state/lastRunTimestamp.txt"

[http]
timeout_secs = 5

{}
"#,
        root.display(),
        extra_config
    );

    let config_path = config_dir.join("revwatch.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_revwatch(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = revwatch_binary();
    let workdir = config_path.parent().unwrap().parent().unwrap();
    let mut command = Command::new(&binary);
    command
        .current_dir(workdir)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args);
    for var in ENV_VARS {
        command.env_remove(var);
    }
    let output = command
        .output()
        .unwrap_or_else(|e| panic!("Failed to run revwatch binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn watermark_file(tmp: &TempDir) -> PathBuf {
    tmp.path().join("state/lastRunTimestamp.txt")
}

#[test]
fn test_watermark_set_show_reset() {
    let (tmp, config_path) = setup_test_env("");

    let (stdout, _, success) = run_revwatch(&config_path, &["watermark", "show"]);
    assert!(success);
    assert!(stdout.contains("no watermark"));

    let (stdout, stderr, success) =
        run_revwatch(&config_path, &["watermark", "set", "2024-03-05T21:07:00Z"]);
    assert!(success, "set failed: stdout={}, stderr={}", stdout, stderr);
    assert_eq!(
        fs::read_to_string(watermark_file(&tmp)).unwrap(),
        "1709672820\n"
    );

    let (stdout, _, success) = run_revwatch(&config_path, &["watermark", "show"]);
    assert!(success);
    assert!(stdout.starts_with("1709672820 (2024-03-05T21:07:00+00:00)"));

    let (stdout, _, success) = run_revwatch(&config_path, &["watermark", "reset"]);
    assert!(success);
    assert!(stdout.contains("watermark reset"));
    assert!(!watermark_file(&tmp).exists());
}

#[test]
fn test_watermark_set_rejects_garbage() {
    let (tmp, config_path) = setup_test_env("");
    let (_, stderr, success) = run_revwatch(&config_path, &["watermark", "set", "soon"]);
    assert!(!success);
    assert!(stderr.contains("invalid watermark"));
    assert!(!watermark_file(&tmp).exists());
}

#[test]
fn test_sources_lists_configuration() {
    let (_tmp, config_path) = setup_test_env("[apple]\napp_id = \"123\"\n");
    let (stdout, _, success) = run_revwatch(&config_path, &["sources"]);
    assert!(success);
    assert!(stdout.contains("SOURCE"));
    assert!(stdout.contains("apple"));
    assert!(stdout.contains("app id 123"));
    assert!(stdout.contains("NOT CONFIGURED"));
}

#[test]
fn test_run_invalid_store_fails_before_fetch() {
    let (tmp, config_path) = setup_test_env("");
    let (_, stderr, success) = run_revwatch(
        &config_path,
        &["run", "--store", "itunes", "--no-prompt"],
    );
    assert!(!success);
    assert!(stderr.contains("invalid store selection 'itunes'"));
    assert!(!watermark_file(&tmp).exists());
}

#[test]
fn test_run_missing_credentials_fails() {
    let (tmp, config_path) = setup_test_env("");
    let (_, stderr, success) = run_revwatch(
        &config_path,
        &["run", "--store", "apple", "--no-prompt"],
    );
    assert!(!success);
    assert!(stderr.contains("APPLE_ID"));
    assert!(!watermark_file(&tmp).exists());
}

#[test]
fn test_run_slack_requires_channel_and_token() {
    let (_tmp, config_path) = setup_test_env("[apple]\napp_id = \"123\"\n");
    let (_, stderr, success) = run_revwatch(
        &config_path,
        &["run", "--store", "apple", "--send-to-slack", "yes", "--no-prompt"],
    );
    assert!(!success);
    assert!(stderr.contains("SLACK_BOT_TOKEN"));
}

#[test]
fn test_run_prints_apple_feed_and_saves_watermark() {
    let server = MockServer::start();
    let feed = server.mock(|when, then| {
        when.method(GET)
            .path("/rss/customerreviews/id=123/sortBy=mostRecent/xml");
        then.status(200).body(FEED);
    });

    let (tmp, config_path) = setup_test_env(&format!(
        "[apple]\napp_id = \"123\"\napp_name = \"iOS Sports\"\nfeed_base = \"{}\"\n",
        server.base_url()
    ));

    let (stdout, stderr, success) = run_revwatch(
        &config_path,
        &["run", "--store", "apple", "--reviews", "1", "--no-prompt"],
    );
    assert!(success, "run failed: stdout={}, stderr={}", stdout, stderr);
    feed.assert();

    assert!(stdout.contains("App: iOS Sports"));
    assert!(stdout.contains("*iOS App Review:* v3.2.1"));
    assert!(stdout.contains("*Date:* March 05, 2024, 01:07 PM"));
    assert!(stdout.contains("*Helpful Votes:* 2 (Total: 3)"));
    assert!(!stdout.contains("Crashes sometimes."));
    assert!(watermark_file(&tmp).exists());

    // Everything in the feed is older than the watermark now.
    let (stdout, _, success) = run_revwatch(
        &config_path,
        &["run", "--store", "apple", "--no-prompt"],
    );
    assert!(success);
    assert!(stdout.contains("No new reviews have occurred in the Apple App Store since the last run."));
}

#[test]
fn test_run_fetch_failure_still_exits_successfully() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET);
        then.status(500).body("internal error");
    });

    let (tmp, config_path) = setup_test_env(&format!(
        "[apple]\napp_id = \"123\"\nfeed_base = \"{}\"\n",
        server.base_url()
    ));

    let (stdout, stderr, success) = run_revwatch(
        &config_path,
        &["run", "--store", "apple", "--no-prompt"],
    );
    assert!(success, "run failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Could not retrieve reviews from the Apple App Store."));
    assert!(stderr.contains("failed to fetch reviews"));
    assert!(watermark_file(&tmp).exists());
}

#[test]
fn test_run_posts_to_slack() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/rss/customerreviews/id=123/sortBy=mostRecent/xml");
        then.status(200).body(FEED);
    });
    let slack = server.mock(|when, then| {
        when.method(POST)
            .path("/api/chat.postMessage")
            .header("authorization", "Bearer xoxb-test")
            .body_contains("\"channel\":\"#reviews\"");
        then.status(200).json_body(serde_json::json!({"ok": true}));
    });

    let (_tmp, config_path) = setup_test_env(&format!(
        "[apple]\napp_id = \"123\"\nfeed_base = \"{base}\"\n\n\
         [slack]\nchannel = \"#reviews\"\ntoken = \"xoxb-test\"\napi_base = \"{base}\"\n",
        base = server.base_url()
    ));

    let (stdout, stderr, success) = run_revwatch(
        &config_path,
        &[
            "run",
            "--store",
            "apple",
            "--ignore-last-run",
            "yes",
            "--send-to-slack",
            "yes",
            "--no-prompt",
        ],
    );
    assert!(success, "run failed: stdout={}, stderr={}", stdout, stderr);
    slack.assert_hits(2);
    assert!(stdout.contains("Crashes sometimes."));
}

#[test]
fn test_dry_run_skips_slack_and_watermark() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/rss/customerreviews/id=123/sortBy=mostRecent/xml");
        then.status(200).body(FEED);
    });
    let slack = server.mock(|when, then| {
        when.method(POST).path("/api/chat.postMessage");
        then.status(200).json_body(serde_json::json!({"ok": true}));
    });

    let (tmp, config_path) = setup_test_env(&format!(
        "[apple]\napp_id = \"123\"\nfeed_base = \"{base}\"\n\n\
         [slack]\nchannel = \"#reviews\"\ntoken = \"xoxb-test\"\napi_base = \"{base}\"\n",
        base = server.base_url()
    ));

    let (stdout, _, success) = run_revwatch(
        &config_path,
        &[
            "run",
            "--store",
            "apple",
            "--send-to-slack",
            "yes",
            "--dry-run",
            "--no-prompt",
        ],
    );
    assert!(success);
    assert!(stdout.contains("Works well."));
    slack.assert_hits(0);
    assert!(!watermark_file(&tmp).exists());
}
