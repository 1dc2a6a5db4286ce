//! Feed side of the run: fetch the RSS document, pick recent items, pull one media URL from each.

pub mod extract;
pub mod fetch;
pub mod filter;

pub use extract::{MediaShape, extract_media_url};
pub use fetch::{is_url, load_feed, parse_feed};
pub use filter::{is_recent, select_downloads, tasks_from_selection};
