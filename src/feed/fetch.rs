//! Feed retrieval: HTTP(S) URL or local file, parsed as RSS 2.0.

use anyhow::{Context, Result};
use chrono::DateTime;
use reqwest::blocking::Client;
use std::path::Path;

use crate::FeedItem;

/// True when `source` should be fetched over HTTP rather than read from disk.
pub fn is_url(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Download (or read) the feed at `source` and return its items in document order.
pub fn load_feed(source: &str, client: &Client) -> Result<Vec<FeedItem>> {
    let bytes = if is_url(source) {
        fetch_feed_bytes(source, client)?
    } else {
        std::fs::read(Path::new(source)).with_context(|| format!("read feed file {}", source))?
    };
    parse_feed(&bytes).with_context(|| format!("parse feed {}", source))
}

fn fetch_feed_bytes(url: &str, client: &Client) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("fetch feed {}", url))?;
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!(
            "feed {} answered HTTP {}: {}",
            url,
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );
    }
    let body = response
        .bytes()
        .with_context(|| format!("read feed body from {}", url))?;
    log::debug!("fetched feed {} ({} bytes)", url, body.len());
    Ok(body.to_vec())
}

/// Parse an RSS document into [`FeedItem`]s.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedItem>> {
    let channel = rss::Channel::read_from(bytes).context("RSS parse error")?;
    let items = channel
        .items()
        .iter()
        .map(|item| FeedItem {
            title: item.title().map(str::to_string),
            pub_date: item
                .pub_date()
                .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok()),
            content: item
                .content()
                .or_else(|| item.description())
                .map(str::to_string),
        })
        .collect::<Vec<_>>();
    log::debug!("feed {:?}: {} items", channel.title(), items.len());
    Ok(items)
}
