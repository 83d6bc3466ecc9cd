//! Apple App Store connector.
//!
//! Polls the public customer-review feed
//! (`/rss/customerreviews/id=<app>/sortBy=mostRecent/xml`), an Atom
//! document with one `<entry>` per review and iTunes-specific fields in the
//! `im:` namespace:
//!
//! ```xml
//! <entry>
//!   <updated>2024-03-05T14:07:00-07:00</updated>
//!   <id>10883236327</id>
//!   <title>Great app</title>
//!   <content type="text">Works well.</content>
//!   <im:voteSum>3</im:voteSum>
//!   <im:voteCount>2</im:voteCount>
//!   <im:rating>5</im:rating>
//!   <im:version>3.2.1</im:version>
//!   <author><name>someone</name></author>
//!   <link rel="related" href="https://itunes.apple.com/us/review?id=..."/>
//!   <content type="html">&lt;table&gt;...</content>
//! </entry>
//! ```
//!
//! The feed has no pagination handling: only the first page is read.

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use tracing::debug;

use crate::config::AppleConfig;
use crate::errors::{snippet, FetchError};
use crate::models::{Review, Store};
use crate::normalize;
use crate::traits::ReviewSource;

/// One `<entry>` of the feed, fields kept as raw text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppleEntry {
    pub id: Option<String>,
    pub updated: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub rating: Option<String>,
    pub vote_sum: Option<String>,
    pub vote_count: Option<String>,
    pub country: Option<String>,
    pub link: Option<String>,
}

pub struct AppleConnector {
    app_id: String,
    app_name: String,
    feed_base: String,
    client: reqwest::Client,
}

impl AppleConnector {
    pub fn new(app_id: String, config: &AppleConfig, client: reqwest::Client) -> Self {
        Self {
            app_id,
            app_name: config.app_name.clone(),
            feed_base: config.feed_base.clone(),
            client,
        }
    }

    pub fn feed_url(&self) -> String {
        format!(
            "{}/rss/customerreviews/id={}/sortBy=mostRecent/xml",
            self.feed_base.trim_end_matches('/'),
            self.app_id
        )
    }
}

#[async_trait]
impl ReviewSource for AppleConnector {
    fn store(&self) -> Store {
        Store::Apple
    }

    fn app_name(&self) -> &str {
        &self.app_name
    }

    async fn fetch(&self) -> Result<Vec<Review>, FetchError> {
        let url = self.feed_url();
        debug!(%url, "fetching Apple review feed");

        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        let xml = resp.text().await?;
        let entries = parse_feed(&xml)?;
        debug!(count = entries.len(), "parsed Apple review feed");

        Ok(entries.into_iter().map(normalize::apple_review).collect())
    }
}

/// Parse the review feed into entries, in document order.
///
/// A feed without `<entry>` elements yields an empty list.
pub fn parse_feed(xml: &str) -> Result<Vec<AppleEntry>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<AppleEntry> = None;
    // Element path below the current <entry>.
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut html_content = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            FetchError::Parse(format!(
                "invalid review feed XML at byte {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(e) => {
                let name = element_name(&e);
                if current.is_none() {
                    if name == "entry" {
                        current = Some(AppleEntry::default());
                        path.clear();
                    }
                } else if let Some(entry) = current.as_mut() {
                    if path.is_empty() {
                        match name.as_str() {
                            "content" => {
                                html_content = attribute(&e, b"type").as_deref() == Some("html")
                            }
                            "link" => capture_link(&e, entry),
                            _ => {}
                        }
                    }
                    path.push(name);
                }
                text.clear();
            }
            Event::Empty(e) => {
                if let Some(entry) = current.as_mut() {
                    if path.is_empty() && element_name(&e) == "link" {
                        capture_link(&e, entry);
                    }
                }
            }
            Event::Text(t) => {
                if current.is_some() {
                    let value = t
                        .unescape()
                        .map_err(|e| FetchError::Parse(format!("invalid text in review feed: {e}")))?;
                    text.push_str(&value);
                }
            }
            Event::CData(c) => {
                if current.is_some() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                if path.is_empty() {
                    entries.extend(current.take());
                } else if let Some(entry) = current.as_mut() {
                    assign_field(entry, &path, text.trim(), html_content);
                    path.pop();
                }
                text.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn capture_link(e: &BytesStart<'_>, entry: &mut AppleEntry) {
    if entry.link.is_some() {
        return;
    }
    let rel = attribute(e, b"rel");
    if rel.is_none() || rel.as_deref() == Some("related") || rel.as_deref() == Some("alternate") {
        entry.link = attribute(e, b"href").filter(|h| !h.is_empty());
    }
}

fn assign_field(entry: &mut AppleEntry, path: &[String], value: &str, html_content: bool) {
    if value.is_empty() {
        return;
    }
    let slot = match path {
        [tag] => match tag.as_str() {
            "id" => &mut entry.id,
            "updated" => &mut entry.updated,
            "title" => &mut entry.title,
            "content" if !html_content => &mut entry.content,
            "im:version" => &mut entry.version,
            "im:rating" => &mut entry.rating,
            "im:voteSum" => &mut entry.vote_sum,
            "im:voteCount" => &mut entry.vote_count,
            "im:country" => &mut entry.country,
            _ => return,
        },
        [parent, child] if parent == "author" && child == "name" => &mut entry.author,
        _ => return,
    };
    *slot = Some(value.to_string());
}
