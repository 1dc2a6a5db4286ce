use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;
use tempfile::{Builder, NamedTempFile, PersistError};

use crate::utils::config::PARTIAL_SUFFIX;

/// New hidden partial file next to `output` (`.<name>.<random>.feedgrab-part`).
/// Every call gets its own file, so two downloads aiming at one output never share bytes.
/// The file is deleted when dropped unless persisted.
pub fn create_partial(output: &Path) -> io::Result<NamedTempFile> {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = match output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let prefix = format!(".{name}.");
    let suffix = format!(".{PARTIAL_SUFFIX}");
    Builder::new()
        .prefix(&prefix)
        .suffix(&suffix)
        .tempfile_in(dir)
}

/// Move a completed partial onto `output` without replacing an existing file.
/// If `output` already exists the error kind is `AlreadyExists` and the partial is deleted
/// once the error is dropped.
pub fn persist_partial(partial: NamedTempFile, output: &Path) -> Result<(), PersistError> {
    partial.persist_noclobber(output).map(|_| ())
}

/// Delete partial files left in `dir` by an interrupted earlier run. Returns how many were removed.
/// Only names ending in `.feedgrab-part` are touched.
pub fn sweep_stale_partials(dir: &Path) -> Result<usize> {
    let suffix = format!(".{PARTIAL_SUFFIX}");
    let mut removed = 0;
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e).with_context(|| format!("read output dir {}", dir.display())),
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let is_partial = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(&suffix));
        if is_partial && path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("remove stale partial {}", path.display()))?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partials_are_unique_hidden_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("Episode 1.mp3");
        let a = create_partial(&out).unwrap();
        let b = create_partial(&out).unwrap();
        assert_ne!(a.path(), b.path());
        for p in [a.path(), b.path()] {
            assert_eq!(p.parent(), Some(dir.path()));
            let name = p.file_name().unwrap().to_str().unwrap();
            assert!(name.starts_with(".Episode 1.mp3."), "{name}");
            assert!(name.ends_with(".feedgrab-part"), "{name}");
        }
    }

    #[test]
    fn test_dropped_partial_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let partial = create_partial(&dir.path().join("ep.mp3")).unwrap();
        let path = partial.path().to_path_buf();
        drop(partial);
        assert!(!path.exists());
    }

    #[test]
    fn test_persist_does_not_replace_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("ep.mp3");
        fs::write(&out, b"first").unwrap();

        let mut partial = create_partial(&out).unwrap();
        partial.write_all(b"second").unwrap();
        let err = persist_partial(partial, &out).unwrap_err();
        assert_eq!(err.error.kind(), io::ErrorKind::AlreadyExists);
        drop(err);

        assert_eq!(fs::read(&out).unwrap(), b"first");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_sweep_removes_only_own_partials() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp3"), b"done").unwrap();
        fs::write(dir.path().join(".b.mp3.x1Yz.feedgrab-part"), b"half").unwrap();
        fs::write(dir.path().join(".c.mp3.Q9aa.feedgrab-part"), b"half").unwrap();
        fs::write(dir.path().join("movie.mkv.part"), b"someone else's").unwrap();
        fs::write(dir.path().join("thesis.part"), b"someone else's").unwrap();

        assert_eq!(sweep_stale_partials(dir.path()).unwrap(), 2);
        assert!(dir.path().join("a.mp3").exists());
        assert!(dir.path().join("movie.mkv.part").exists());
        assert!(dir.path().join("thesis.part").exists());
        assert!(!dir.path().join(".b.mp3.x1Yz.feedgrab-part").exists());
    }

    #[test]
    fn test_sweep_missing_dir_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(sweep_stale_partials(&dir.path().join("nope")).unwrap(), 0);
    }
}
