//! Crash-safe file writes.
//!
//! Every write stages its bytes in a uniquely named temp file in the target's
//! directory and then renames it into place, so concurrent writers never share
//! a staging path and readers only ever see complete files.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{RegistryError, RegistryResult};

/// Whether an existing destination is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Existing {
    Replace,
    /// Content-addressed target: an existing file already holds these bytes.
    Keep,
}

fn io_error(action: &str, path: &Path, err: impl std::fmt::Display) -> RegistryError {
    RegistryError::Io {
        message: format!("failed to {} {}: {}", action, path.display(), err),
    }
}

fn stage_and_persist(path: &Path, content: &[u8], existing: Existing) -> RegistryResult<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut staged =
        NamedTempFile::new_in(dir).map_err(|e| io_error("stage a temp file in", dir, e))?;
    staged
        .write_all(content)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| io_error("write temp file for", path, e))?;

    let persisted = match existing {
        Existing::Replace => staged.persist(path),
        Existing::Keep => staged.persist_noclobber(path),
    };

    match persisted {
        Ok(_) => Ok(()),
        // The losing writer's temp file is removed when `e.file` drops.
        Err(e) if existing == Existing::Keep && e.error.kind() == ErrorKind::AlreadyExists => {
            Ok(())
        }
        Err(e) => Err(io_error("persist", path, e.error)),
    }
}

/// Write `content` to `path` atomically.
pub(crate) async fn write_atomic(
    path: &Path,
    content: &[u8],
    existing: Existing,
) -> RegistryResult<()> {
    let path: PathBuf = path.to_path_buf();
    let content = content.to_vec();
    tokio::task::spawn_blocking(move || stage_and_persist(&path, &content, existing))
        .await
        .map_err(|e| RegistryError::Io {
            message: format!("write task failed: {}", e),
        })?
}

pub(crate) async fn create_dir_all(path: &Path) -> RegistryResult<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| io_error("create directory", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_replace_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");

        write_atomic(&path, b"first", Existing::Replace).await.unwrap();
        write_atomic(&path, b"second", Existing::Replace).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert_eq!(entries(dir.path()), vec!["record.json"]);
    }

    #[tokio::test]
    async fn test_keep_leaves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cert.der");

        write_atomic(&path, b"first", Existing::Keep).await.unwrap();
        write_atomic(&path, b"second", Existing::Keep).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"first");
        assert_eq!(entries(dir.path()), vec!["cert.der"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_to_one_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shared.bin");

        let mut tasks = Vec::new();
        for i in 0..16u8 {
            let path = path.clone();
            let existing = if i % 2 == 0 {
                Existing::Replace
            } else {
                Existing::Keep
            };
            tasks.push(tokio::spawn(async move {
                write_atomic(&path, &[i; 32], existing).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let content = std::fs::read(&path).unwrap();
        assert_eq!(content.len(), 32);
        assert!(content.iter().all(|b| *b == content[0]));
        assert_eq!(entries(dir.path()), vec!["shared.bin"]);
    }
}
