//! Item selection: recency filter plus URL extraction, one task per surviving item.

use chrono::Datelike;
use std::collections::BTreeMap;

use super::extract::{MediaShape, extract_media_url};
use crate::{FeedItem, Task};

/// Coarse recency check: published on day-of-month `1..=max_day`. Items without a date never pass.
pub fn is_recent(item: &FeedItem, max_day: u32) -> bool {
    item.pub_date.is_some_and(|d| d.day() <= max_day)
}

/// Map title → media URL for every recent item whose content yields a URL.
/// Per-item problems are logged and the item skipped; this never fails as a whole.
/// When two items share a title, the later one in document order wins.
pub fn select_downloads(
    items: &[FeedItem],
    max_day: u32,
    shape: &MediaShape,
) -> BTreeMap<String, String> {
    let mut selected = BTreeMap::new();
    for item in items {
        let Some(title) = item.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
            log::warn!("skipping item without a title");
            continue;
        };
        if item.pub_date.is_none() {
            log::warn!("{:?}: no parseable pubDate, skipping", title);
            continue;
        }
        if !is_recent(item, max_day) {
            log::debug!("{:?}: published after day {}, skipping", title, max_day);
            continue;
        }
        let content = item.content.as_deref().unwrap_or("");
        match extract_media_url(content, shape) {
            Ok(url) => {
                if let Some(previous) = selected.insert(title.to_string(), url) {
                    log::warn!("{:?}: duplicate title, replacing {}", title, previous);
                }
            }
            Err(e) => log::warn!("{:?}: {}", title, e),
        }
    }
    selected
}

/// Fresh tasks (attempt 0) in title order.
pub fn tasks_from_selection(selected: BTreeMap<String, String>) -> Vec<Task> {
    selected
        .into_iter()
        .map(|(name, url)| Task::new(name, url))
        .collect()
}
