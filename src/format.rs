//! Fixed-layout text rendering of reviews (Slack mrkdwn).
//!
//! ```text
//! *iOS App Review:* v3.2.1
//! *Date:* March 05, 2024, 01:07 PM
//! *Rating:* 5/5
//! *Title:* Great app
//! *Detail:* Works well.
//! - - - - - - - -
//! *by:* sporty_fan
//! *Helpful Votes:* 2 (Total: 3)
//! *Review ID:* 10883236327
//!
//! =========================
//! ```
//!
//! Every labeled line is dropped when its field is absent. Dates are shown
//! in a fixed reference zone, not the machine's local zone.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt::Display;

use crate::models::{Review, Store};

pub const SEPARATOR: &str = "=========================";
pub const DIVIDER: &str = "- - - - - - - -";

/// Render an instant as e.g. `March 05, 2024, 02:07 PM` in `tz`.
pub fn format_date(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz)
        .format("%B %d, %Y, %I:%M %p")
        .to_string()
}

fn push_labeled(lines: &mut Vec<String>, label: &str, value: Option<impl Display>) {
    if let Some(value) = value {
        let value = value.to_string();
        if !value.trim().is_empty() {
            lines.push(format!("*{}:* {}", label, value));
        }
    }
}

/// Render one review as a text block ending in the separator line.
pub fn format_review(review: &Review, tz: Tz) -> String {
    let extra = &review.extra;
    let mut lines = Vec::new();

    let mut header = format!("*{}:*", review.store.review_heading());
    if let Some(version) = extra.app_version.as_deref().filter(|v| !v.is_empty()) {
        header.push_str(&format!(" v{}", version));
    }
    lines.push(header);

    push_labeled(&mut lines, "Date", review.timestamp.map(|t| format_date(t, tz)));
    push_labeled(&mut lines, "Rating", review.rating.map(|r| format!("{}/5", r)));
    if review.store == Store::Apple {
        push_labeled(&mut lines, "Title", review.title.as_deref());
    }
    push_labeled(&mut lines, "Detail", Some(&review.text));
    lines.push(DIVIDER.to_string());
    push_labeled(&mut lines, "by", Some(&review.author));
    push_labeled(&mut lines, "Country", extra.country.as_deref());

    match review.store {
        Store::Apple => lines.push(format!(
            "*Helpful Votes:* {} (Total: {})",
            extra.vote_count.unwrap_or(0),
            extra.vote_sum.unwrap_or(0)
        )),
        Store::Google => lines.push(format!(
            "*Thumbs Up:* {} | *Thumbs Down:* {}",
            extra.thumbs_up.unwrap_or(0),
            extra.thumbs_down.unwrap_or(0)
        )),
    }

    push_labeled(&mut lines, "Language", extra.language.as_deref());
    push_labeled(&mut lines, "Device", extra.device.as_deref());
    push_labeled(&mut lines, "Android OS Version", extra.os_version.as_deref());
    push_labeled(&mut lines, "Product Name", extra.product_name.as_deref());
    push_labeled(&mut lines, "Manufacturer", extra.manufacturer.as_deref());
    push_labeled(&mut lines, "Screen Density DPI", extra.screen_density_dpi);
    push_labeled(&mut lines, "Review ID", review.identifier.as_deref());
    push_labeled(&mut lines, "Review Link", review.link.as_deref());

    lines.push(String::new());
    lines.push(SEPARATOR.to_string());
    lines.join("\n")
}

/// Section header printed once per polled store.
pub fn section_header(app_name: &str) -> String {
    format!("{SEPARATOR}\nApp: {app_name}\n{SEPARATOR}")
}

/// Notice printed when a store has nothing new to deliver.
pub fn nothing_new_notice(store: Store) -> String {
    format!(
        "No new reviews have occurred in the {} since the last run.",
        store.label()
    )
}

/// Notice printed when a store could not be fetched.
pub fn fetch_failed_notice(store: Store) -> String {
    format!("Could not retrieve reviews from the {}.", store.label())
}
