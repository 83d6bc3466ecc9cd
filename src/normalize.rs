//! Vendor record → [`Review`] projection.
//!
//! Pure functions, one per vendor schema. Missing optional fields become
//! `None` (or the documented placeholder for text and author); nothing here
//! fails. Blank strings from the vendor count as missing.

use chrono::{DateTime, Utc};

use crate::connector_apple::AppleEntry;
use crate::connector_google::GoogleReview;
use crate::models::{Review, ReviewExtra, Store};

/// Placeholder for a review without body text.
pub const NO_TEXT: &str = "No review text";
/// Placeholder for a review without an author name.
pub const ANONYMOUS: &str = "Anonymous";

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_number(value: Option<&str>) -> Option<u32> {
    value.and_then(|s| s.trim().parse::<u32>().ok())
}

fn valid_rating(rating: u8) -> Option<u8> {
    (1..=5).contains(&rating).then_some(rating)
}

pub fn apple_review(entry: AppleEntry) -> Review {
    let raw_json = serde_json::to_value(&entry).ok();

    let timestamp = entry
        .updated
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let rating = entry
        .rating
        .as_deref()
        .and_then(|s| s.trim().parse::<u8>().ok())
        .and_then(valid_rating);

    let extra = ReviewExtra {
        app_version: present(entry.version),
        country: present(entry.country),
        vote_count: parse_number(entry.vote_count.as_deref()),
        vote_sum: parse_number(entry.vote_sum.as_deref()),
        ..ReviewExtra::default()
    };

    Review {
        store: Store::Apple,
        timestamp,
        rating,
        title: present(entry.title),
        text: present(entry.content).unwrap_or_else(|| NO_TEXT.to_string()),
        author: present(entry.author).unwrap_or_else(|| ANONYMOUS.to_string()),
        identifier: present(entry.id),
        link: present(entry.link),
        extra,
        raw_json,
    }
}

/// Deep link to a review in the Play Console listing.
pub fn google_review_link(package_name: &str, review_id: &str) -> String {
    format!(
        "https://play.google.com/store/apps/details?id={}&reviewId={}",
        package_name, review_id
    )
}

pub fn google_review(review: GoogleReview, package_name: &str) -> Review {
    let raw_json = serde_json::to_value(&review).ok();

    // Only the first comment is the reviewer's; later entries are replies.
    let comment = review
        .comments
        .into_iter()
        .next()
        .and_then(|c| c.user_comment)
        .unwrap_or_default();

    let timestamp = comment
        .last_modified
        .as_ref()
        .and_then(|t| t.seconds)
        .and_then(|secs| DateTime::from_timestamp(secs, 0));

    let metadata = comment.device_metadata.unwrap_or_default();
    let identifier = present(review.review_id);
    let link = identifier
        .as_deref()
        .map(|id| google_review_link(package_name, id));

    let extra = ReviewExtra {
        app_version: present(comment.app_version_name),
        thumbs_up: comment.thumbs_up_count,
        thumbs_down: comment.thumbs_down_count,
        language: present(comment.reviewer_language),
        device: present(comment.device),
        os_version: comment.android_os_version.map(|v| v.to_string()),
        product_name: present(metadata.product_name),
        manufacturer: present(metadata.manufacturer),
        screen_density_dpi: metadata.screen_density_dpi,
        ..ReviewExtra::default()
    };

    Review {
        store: Store::Google,
        timestamp,
        rating: comment.star_rating.and_then(valid_rating),
        title: None,
        text: present(comment.text).unwrap_or_else(|| NO_TEXT.to_string()),
        author: present(review.author_name).unwrap_or_else(|| ANONYMOUS.to_string()),
        identifier,
        link,
        extra,
        raw_json,
    }
}
