//! Extension seams between the run pipeline and the outside world.
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐
//! │ Apple feed   │  │ Google Play  │   ReviewSource
//! └──────┬───────┘  └──────┬───────┘
//!        └────────┬────────┘
//!                 ▼
//!       select → format → dispatch ───▶ WebhookSink (Slack)
//! ```
//!
//! The pipeline only talks to these traits, so tests (and alternative
//! vendors) can plug in in-memory implementations.

use async_trait::async_trait;

use crate::errors::{FetchError, WebhookError};
use crate::models::{Review, Store};

/// A store that can be polled for its current review listing.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use revwatch::errors::FetchError;
/// use revwatch::models::{Review, Store};
/// use revwatch::traits::ReviewSource;
///
/// struct Empty;
///
/// #[async_trait]
/// impl ReviewSource for Empty {
///     fn store(&self) -> Store { Store::Apple }
///     fn app_name(&self) -> &str { "Example" }
///     async fn fetch(&self) -> Result<Vec<Review>, FetchError> { Ok(vec![]) }
/// }
/// ```
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Which store this source polls.
    fn store(&self) -> Store;

    /// App name shown in the report section header.
    fn app_name(&self) -> &str;

    /// Fetch and normalize the store's current reviews.
    ///
    /// An empty listing is `Ok(vec![])`, not an error. Order is the
    /// vendor's order; the selection engine does the sorting.
    async fn fetch(&self) -> Result<Vec<Review>, FetchError>;
}

/// A messaging endpoint that formatted reviews are forwarded to.
#[async_trait]
pub trait WebhookSink: Send + Sync {
    /// Delivery target for log messages (e.g. a channel name).
    fn target(&self) -> &str;

    /// Post one message. Called at most once per review per run.
    async fn post(&self, text: &str) -> Result<(), WebhookError>;
}
