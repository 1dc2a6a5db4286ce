//! Feed source from the environment: `FEEDGRAB_FEED` → `.env` in the output dir.

use anyhow::{Context, Result};
use std::path::Path;

use crate::utils::config::PackagePaths;

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Read the feed source from `FEEDGRAB_FEED`, loading `.env` from `dir` first when the
/// variable is not already set. Variables already in the environment are never overwritten.
/// A `.env` that cannot be parsed is an error; a missing one is not.
pub fn feed_from_env(dir: &Path) -> Result<Option<String>> {
    let key = PackagePaths::get().feed_env_var();
    if let Some(s) = non_empty_var(key) {
        return Ok(Some(s));
    }
    let env_path = dir.join(".env");
    if !env_path.is_file() {
        return Ok(None);
    }
    dotenvy::from_path(&env_path).with_context(|| format!("load {}", env_path.display()))?;
    Ok(non_empty_var(key))
}
