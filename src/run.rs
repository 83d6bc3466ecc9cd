//! Run orchestration.
//!
//! One run: load the watermark, fetch the selected stores concurrently,
//! then for each store (Apple first) select, format and dispatch its new
//! reviews, and finally persist the next watermark.
//!
//! A store whose fetch fails contributes nothing; the other store and the
//! watermark update are unaffected. Only configuration problems abort a run,
//! and those are caught in [`execute`] before anything is fetched.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::io::{self, Write};
use std::time::Duration;
use tracing::{error, info};

use crate::config::Config;
use crate::connector_apple::AppleConnector;
use crate::connector_google::GoogleConnector;
use crate::dispatch::Dispatcher;
use crate::errors::FetchError;
use crate::format::format_review;
use crate::models::{Review, Store, StoreSelection};
use crate::select::{select_reviews, SelectOptions};
use crate::slack::SlackClient;
use crate::traits::{ReviewSource, WebhookSink};
use crate::watermark::{WatermarkStore, WatermarkStrategy};

/// Fully resolved options for one run. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub stores: StoreSelection,
    /// `None` means every passing review.
    pub max_count: Option<usize>,
    pub ignore_watermark: bool,
    pub send_to_webhook: bool,
    pub debug: bool,
    /// Print only: no webhook posts, no watermark write.
    pub dry_run: bool,
    pub strategy: WatermarkStrategy,
    pub time_zone: Tz,
}

impl RunConfig {
    /// Whether formatted reviews are actually posted.
    pub fn delivers(&self) -> bool {
        self.send_to_webhook && !self.dry_run
    }
}

/// The outside world a run talks to.
pub struct Collaborators<'a> {
    pub apple: Option<&'a dyn ReviewSource>,
    pub google: Option<&'a dyn ReviewSource>,
    pub webhook: Option<&'a dyn WebhookSink>,
    pub watermark: &'a WatermarkStore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    pub store: Store,
    pub fetched: usize,
    pub selected: usize,
    pub fetch_failed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub stores: Vec<StoreSummary>,
    pub webhook_delivered: usize,
    pub webhook_failed: usize,
    /// The value persisted, if the watermark was written.
    pub watermark_written: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn store(&self, store: Store) -> Option<&StoreSummary> {
        self.stores.iter().find(|s| s.store == store)
    }

    pub fn total_selected(&self) -> usize {
        self.stores.iter().map(|s| s.selected).sum()
    }
}

async fn fetch_from(
    source: Option<&dyn ReviewSource>,
) -> Option<Result<Vec<Review>, FetchError>> {
    match source {
        Some(source) => Some(source.fetch().await),
        None => None,
    }
}

/// Run the pipeline against the given collaborators, writing the report to `out`.
///
/// Stores not included in `config.stores` are skipped even if a source is
/// supplied for them.
pub async fn run_with<W: Write>(
    config: &RunConfig,
    collaborators: &Collaborators<'_>,
    out: W,
) -> io::Result<RunSummary> {
    let previous = collaborators.watermark.load();
    let started = Utc::now();

    let apple = collaborators
        .apple
        .filter(|_| config.stores.includes(Store::Apple));
    let google = collaborators
        .google
        .filter(|_| config.stores.includes(Store::Google));

    let (apple_result, google_result) = tokio::join!(fetch_from(apple), fetch_from(google));

    let options = SelectOptions {
        max_count: config.max_count,
        watermark: previous,
        ignore_watermark: config.ignore_watermark,
    };
    let deliver = config.delivers();
    let mut dispatcher = Dispatcher::new(out, collaborators.webhook, config.debug);
    let mut summary = RunSummary::default();
    let mut newest_delivered: Option<DateTime<Utc>> = None;

    for (source, result) in [(apple, apple_result), (google, google_result)] {
        let (Some(source), Some(result)) = (source, result) else {
            continue;
        };
        let store = source.store();
        dispatcher.section_header(source.app_name())?;

        let reviews = match result {
            Ok(reviews) => reviews,
            Err(e) => {
                error!(store = %store, error = %e, "failed to fetch reviews");
                dispatcher.fetch_failed(store)?;
                summary.stores.push(StoreSummary {
                    store,
                    fetched: 0,
                    selected: 0,
                    fetch_failed: true,
                });
                continue;
            }
        };

        let fetched = reviews.len();
        let selected = select_reviews(reviews, &options);
        info!(store = %store, fetched, selected = selected.len(), "reviews selected");

        if selected.is_empty() {
            dispatcher.nothing_new(store)?;
        }
        for review in &selected {
            let text = format_review(review, config.time_zone);
            dispatcher.emit(review, &text, deliver).await?;
            newest_delivered = newest_delivered.max(review.timestamp);
        }

        summary.stores.push(StoreSummary {
            store,
            fetched,
            selected: selected.len(),
            fetch_failed: false,
        });
    }

    summary.webhook_delivered = dispatcher.delivered();
    summary.webhook_failed = dispatcher.failed();

    if config.dry_run {
        info!("dry run, watermark left unchanged");
    } else {
        let next = config.strategy.next(previous, newest_delivered, started);
        if collaborators.watermark.save(next) {
            summary.watermark_written = Some(next);
        }
    }

    Ok(summary)
}

/// Build the real connectors and Slack client from `config` and run against stdout.
pub async fn execute(config: &Config, run: &RunConfig) -> Result<RunSummary> {
    config.validate_for_run(run.stores, run.delivers())?;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .user_agent(concat!("revwatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let apple = match (&config.apple.app_id, run.stores.includes(Store::Apple)) {
        (Some(app_id), true) => Some(AppleConnector::new(
            app_id.clone(),
            &config.apple,
            client.clone(),
        )),
        _ => None,
    };

    let google = match (
        &config.google.package_name,
        &config.google.key_path,
        run.stores.includes(Store::Google),
    ) {
        (Some(package), Some(key_path), true) => Some(GoogleConnector::new(
            package.clone(),
            key_path.clone(),
            &config.google,
            client.clone(),
        )),
        _ => None,
    };

    let slack = match (&config.slack.token, &config.slack.channel, run.delivers()) {
        (Some(token), Some(channel), true) => Some(SlackClient::new(
            token.clone(),
            channel.clone(),
            &config.slack,
            client,
        )),
        _ => None,
    };

    let watermark = WatermarkStore::new(config.watermark.path.clone());
    let collaborators = Collaborators {
        apple: apple.as_ref().map(|a| a as &dyn ReviewSource),
        google: google.as_ref().map(|g| g as &dyn ReviewSource),
        webhook: slack.as_ref().map(|s| s as &dyn WebhookSink),
        watermark: &watermark,
    };

    let summary = run_with(run, &collaborators, io::stdout())
        .await
        .context("Failed to write report")?;

    for store in &summary.stores {
        info!(
            store = %store.store,
            fetched = store.fetched,
            selected = store.selected,
            fetch_failed = store.fetch_failed,
            "store summary"
        );
    }
    info!(
        delivered = summary.webhook_delivered,
        failed = summary.webhook_failed,
        watermark = ?summary.watermark_written.map(|w| w.timestamp()),
        "run complete"
    );

    Ok(summary)
}
