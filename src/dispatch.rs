//! Report output and webhook delivery.
//!
//! Every formatted block is written to the report writer (stdout in the
//! CLI). When delivery is requested the same text is posted through the
//! [`WebhookSink`], once, with no retry. A failed post is logged and counted
//! and never stops the blocks that follow.

use std::io::{self, Write};
use tracing::{info, warn};

use crate::format;
use crate::models::{Review, Store};
use crate::traits::WebhookSink;

pub struct Dispatcher<'a, W: Write> {
    out: W,
    webhook: Option<&'a dyn WebhookSink>,
    debug: bool,
    delivered: usize,
    failed: usize,
}

impl<'a, W: Write> Dispatcher<'a, W> {
    pub fn new(out: W, webhook: Option<&'a dyn WebhookSink>, debug: bool) -> Self {
        Self {
            out,
            webhook,
            debug,
            delivered: 0,
            failed: 0,
        }
    }

    pub fn section_header(&mut self, app_name: &str) -> io::Result<()> {
        writeln!(self.out, "{}", format::section_header(app_name))
    }

    pub fn nothing_new(&mut self, store: Store) -> io::Result<()> {
        writeln!(self.out, "{}", format::nothing_new_notice(store))
    }

    pub fn fetch_failed(&mut self, store: Store) -> io::Result<()> {
        writeln!(self.out, "{}", format::fetch_failed_notice(store))
    }

    /// Write one formatted block and, if `deliver` is set, post it.
    pub async fn emit(&mut self, review: &Review, text: &str, deliver: bool) -> io::Result<()> {
        writeln!(self.out, "\n{}", text)?;

        if self.debug {
            if let Some(raw) = &review.raw_json {
                let pretty = serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string());
                writeln!(self.out, "Full Review Object: {}", pretty)?;
            }
        }

        if !deliver {
            return Ok(());
        }

        let Some(webhook) = self.webhook else {
            warn!("delivery requested but no webhook is configured");
            self.failed += 1;
            return Ok(());
        };

        match webhook.post(text).await {
            Ok(()) => {
                self.delivered += 1;
                info!(channel = webhook.target(), store = %review.store, "review delivered");
            }
            Err(e) => {
                self.failed += 1;
                warn!(
                    channel = webhook.target(),
                    store = %review.store,
                    review_id = review.identifier.as_deref().unwrap_or("-"),
                    error = %e,
                    "review delivery failed"
                );
            }
        }
        Ok(())
    }

    pub fn delivered(&self) -> usize {
        self.delivered
    }

    pub fn failed(&self) -> usize {
        self.failed
    }
}
