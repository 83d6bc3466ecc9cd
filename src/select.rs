//! Review selection: sort newest first, drop what the watermark already
//! covers, keep at most `max_count`.

use chrono::{DateTime, Utc};

use crate::models::Review;

#[derive(Debug, Clone, Copy)]
pub struct SelectOptions {
    /// `None` means no limit.
    pub max_count: Option<usize>,
    pub watermark: DateTime<Utc>,
    /// Deliver regardless of the watermark.
    pub ignore_watermark: bool,
}

/// Select the reviews to deliver for one store.
///
/// 1. Stable sort by timestamp, newest first (ties keep fetch order).
/// 2. Unless `ignore_watermark`, keep only `timestamp > watermark`. A review
///    exactly at the watermark was already delivered.
/// 3. Truncate to `max_count`.
///
/// Reviews without a timestamp sort as epoch-zero, so they come last. They
/// never pass the watermark filter, whatever the watermark.
pub fn select_reviews(mut reviews: Vec<Review>, opts: &SelectOptions) -> Vec<Review> {
    reviews.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));

    if !opts.ignore_watermark {
        reviews.retain(|r| r.timestamp.is_some_and(|t| t > opts.watermark));
    }

    if let Some(max) = opts.max_count {
        reviews.truncate(max);
    }

    reviews
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReviewExtra, Store};

    fn review(ts: Option<i64>, id: &str) -> Review {
        Review {
            store: Store::Apple,
            timestamp: ts.and_then(|s| DateTime::from_timestamp(s, 0)),
            rating: None,
            title: None,
            text: "t".into(),
            author: "a".into(),
            identifier: Some(id.into()),
            link: None,
            extra: ReviewExtra::default(),
            raw_json: None,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn opts(max_count: Option<usize>, watermark: i64, ignore: bool) -> SelectOptions {
        SelectOptions {
            max_count,
            watermark: at(watermark),
            ignore_watermark: ignore,
        }
    }

    fn ids(reviews: &[Review]) -> Vec<&str> {
        reviews
            .iter()
            .map(|r| r.identifier.as_deref().unwrap())
            .collect()
    }

    #[test]
    fn filters_sorts_and_truncates() {
        let input = vec![
            review(Some(100), "a"),
            review(Some(50), "b"),
            review(Some(200), "c"),
        ];
        let out = select_reviews(input, &opts(Some(2), 75, false));
        assert_eq!(ids(&out), vec!["c", "a"]);
    }

    #[test]
    fn review_at_watermark_is_excluded() {
        let input = vec![review(Some(75), "eq"), review(Some(76), "gt")];
        let out = select_reviews(input, &opts(None, 75, false));
        assert_eq!(ids(&out), vec!["gt"]);
    }

    #[test]
    fn ignore_watermark_keeps_everything_sorted() {
        let input = vec![
            review(Some(10), "old"),
            review(None, "undated"),
            review(Some(300), "new"),
        ];
        let out = select_reviews(input, &opts(None, 1_000, true));
        assert_eq!(ids(&out), vec!["new", "old", "undated"]);
    }

    #[test]
    fn undated_review_never_passes_the_filter() {
        let input = vec![review(None, "undated"), review(Some(1), "dated")];
        let out = select_reviews(input, &opts(None, 0, false));
        assert_eq!(ids(&out), vec!["dated"]);

        let input = vec![review(None, "undated"), review(Some(-1), "pre-epoch")];
        let out = select_reviews(input, &opts(None, -5, false));
        assert_eq!(ids(&out), vec!["pre-epoch"]);
    }

    #[test]
    fn undated_review_passes_when_watermark_ignored() {
        let input = vec![review(None, "undated")];
        let out = select_reviews(input, &opts(None, -5, true));
        assert_eq!(ids(&out), vec!["undated"]);
    }

    #[test]
    fn ties_keep_fetch_order() {
        let input = vec![
            review(Some(100), "first"),
            review(Some(100), "second"),
            review(Some(100), "third"),
        ];
        let out = select_reviews(input, &opts(None, 0, false));
        assert_eq!(ids(&out), vec!["first", "second", "third"]);
    }

    #[test]
    fn truncation_is_min_of_limit_and_passing() {
        let make = || (1..=5).map(|i| review(Some(i * 10), "x")).collect::<Vec<_>>();
        for k in 0..8 {
            let out = select_reviews(make(), &opts(Some(k), 25, false));
            // 30, 40, 50 pass the watermark
            assert_eq!(out.len(), k.min(3));
        }
    }

    #[test]
    fn result_matches_strict_filter_for_every_watermark() {
        let stamps = [5_i64, 40, 40, 17, 99, 0, 63];
        for w in [-1_i64, 0, 5, 17, 40, 41, 99, 100] {
            let input = stamps
                .iter()
                .map(|s| review(Some(*s), "x"))
                .collect::<Vec<_>>();
            let out = select_reviews(input, &opts(None, w, false));
            let mut expected: Vec<i64> = stamps.iter().copied().filter(|s| *s > w).collect();
            expected.sort_by(|a, b| b.cmp(a));
            let got: Vec<i64> = out.iter().map(|r| r.sort_key().timestamp()).collect();
            assert_eq!(got, expected, "watermark {w}");
        }
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(select_reviews(Vec::new(), &opts(Some(3), 0, false)).is_empty());
    }
}
