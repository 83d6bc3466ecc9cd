//! # revwatch
//!
//! Incremental app-store review relay.
//!
//! revwatch polls the Apple App Store customer-review feed and the Google
//! Play review listing, keeps only the reviews that arrived since the last
//! run (tracked by a persisted watermark), prints them as a fixed-layout
//! report and optionally posts each one to a Slack channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌───────────┐   ┌──────────┐   ┌──────────┐
//! │ Connectors  │──▶│ Normalize │──▶│  Select  │──▶│  Format  │
//! │ Apple/Google│   └───────────┘   └────┬─────┘   └────┬─────┘
//! └─────────────┘                        │              ▼
//!                                 ┌──────┴─────┐  ┌──────────┐
//!                                 │ Watermark  │  │ Dispatch │──▶ stdout / Slack
//!                                 └────────────┘  └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! revwatch sources                                   # check credentials
//! revwatch run --store both --reviews 5 --no-prompt  # print new reviews
//! revwatch run --store apple --send-to-slack yes     # and post them
//! revwatch watermark show
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML + environment configuration |
//! | [`models`] | Core data types |
//! | [`errors`] | Error taxonomy |
//! | [`traits`] | `ReviewSource` / `WebhookSink` seams |
//! | [`connector_apple`] | Apple customer-review feed |
//! | [`connector_google`] | Google Play Android Publisher API |
//! | [`normalize`] | Vendor record → `Review` |
//! | [`select`] | Sort, watermark filter, truncate |
//! | [`format`] | Report text layout |
//! | [`dispatch`] | Console output and webhook delivery |
//! | [`slack`] | Slack `chat.postMessage` client |
//! | [`watermark`] | Persisted last-run watermark |
//! | [`prompt`] | Flag / interactive option resolution |
//! | [`run`] | Run orchestration |
//! | [`sources`] | Configuration status listing |

pub mod config;
pub mod connector_apple;
pub mod connector_google;
pub mod dispatch;
pub mod errors;
pub mod format;
pub mod models;
pub mod normalize;
pub mod prompt;
pub mod run;
pub mod select;
pub mod slack;
pub mod sources;
pub mod traits;
pub mod watermark;
