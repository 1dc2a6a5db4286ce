//! Naming and sizing helpers

use std::path::{Path, PathBuf};

use crate::utils::config::WorkerThreadLimits;
use crate::utils::max_workers_by_fd_limit;

/// Replace characters that would turn a title into a different path (separators, NUL).
pub fn sanitize_file_stem(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();
    match cleaned.as_str() {
        "" | "." | ".." => "_".repeat(cleaned.len().max(1)),
        _ => cleaned,
    }
}

/// `<dir>/<title>.<ext>`, the single output a task produces.
pub fn output_path_for(dir: &Path, name: &str, extension: &str) -> PathBuf {
    let stem = sanitize_file_stem(name);
    if extension.is_empty() {
        dir.join(stem)
    } else {
        dir.join(format!("{stem}.{extension}"))
    }
}

/// Initial pool size: explicit request, else available parallelism; capped by the FD limit.
pub fn determine_worker_count(requested: Option<usize>, limits: WorkerThreadLimits) -> usize {
    let wanted = requested.unwrap_or(limits.all_threads);
    let capped = match max_workers_by_fd_limit() {
        Some(max) if max < wanted => {
            log::debug!("capping workers {} -> {} (fd limit)", wanted, max);
            max
        }
        _ => wanted,
    };
    capped.max(limits.floor)
}
