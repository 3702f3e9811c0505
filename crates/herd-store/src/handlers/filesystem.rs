//! Filesystem storage handler for production

use async_trait::async_trait;
use fs2::FileExt;
use herd_core::{StorageEffects, StorageError};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Name of the advisory lock file. Escaped key names never start with a dot.
const LOCK_FILE: &str = ".lock";

/// Filesystem storage handler: one file per key under a base directory.
///
/// Writes land in a temporary sibling file that is then renamed over the
/// target, so readers observe either the previous value or the complete new
/// one.
///
/// An open handler holds an exclusive advisory lock on the directory until
/// its last clone is dropped. A second process (or a second `open` in this
/// one) waits, so read-modify-write sequences from separate invocations never
/// interleave.
#[derive(Debug, Clone)]
pub struct FilesystemStorageHandler {
    base_path: PathBuf,
    _lock: Arc<DirectoryLock>,
}

#[derive(Debug)]
struct DirectoryLock {
    file: File,
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

impl FilesystemStorageHandler {
    /// Open the store at `base_path`, creating the directory if needed and
    /// waiting for any other holder of the directory lock to release it.
    pub async fn open(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        let lock_file = Self::prepare(&base_path).await?;
        let lock_path = base_path.clone();
        let file = tokio::task::spawn_blocking(move || {
            lock_file.lock_exclusive()?;
            Ok::<_, std::io::Error>(lock_file)
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("Lock task failed: {e}")))?
        .map_err(|e| {
            StorageError::Unavailable(format!("Failed to lock {}: {e}", lock_path.display()))
        })?;
        debug!(base_path = %base_path.display(), "Store directory locked");
        Ok(Self::locked(base_path, file))
    }

    /// Like [`open`](Self::open) but fails with
    /// [`StorageError::Unavailable`] instead of waiting for the lock.
    pub async fn try_open(base_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let base_path = base_path.into();
        let file = Self::prepare(&base_path).await?;
        file.try_lock_exclusive().map_err(|e| {
            StorageError::Unavailable(format!(
                "{} is in use by another invocation: {e}",
                base_path.display()
            ))
        })?;
        Ok(Self::locked(base_path, file))
    }

    async fn prepare(base_path: &Path) -> Result<File, StorageError> {
        fs::create_dir_all(base_path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to create {}: {e}", base_path.display()))
        })?;
        let lock_path = base_path.join(LOCK_FILE);
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                StorageError::WriteFailed(format!("Failed to open {}: {e}", lock_path.display()))
            })
    }

    fn locked(base_path: PathBuf, file: File) -> Self {
        Self {
            base_path,
            _lock: Arc::new(DirectoryLock { file }),
        }
    }

    /// Directory holding the key files
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_to_path(&self, key: &str) -> Result<PathBuf, String> {
        if key.is_empty() {
            return Err("empty key".to_string());
        }
        Ok(self.base_path.join(escape_key(key)))
    }
}

/// Map a key to a single path component, injectively.
///
/// ASCII alphanumerics, `_` and `-` pass through; every other byte, `.` and
/// `%` included, becomes `%XX`.
fn escape_key(key: &str) -> String {
    let mut escaped = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            escaped.push(char::from(byte));
        } else {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }
    escaped
}

#[async_trait]
impl StorageEffects for FilesystemStorageHandler {
    async fn store(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let path = self.key_to_path(key).map_err(StorageError::WriteFailed)?;
        let mut staging = path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        fs::write(&staging, value)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("I/O error: {e}")))?;
        fs::rename(&staging, &path)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("I/O error: {e}")))?;
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let Ok(path) = self.key_to_path(key) else {
            return Ok(None);
        };
        match fs::read(path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed(format!("I/O error: {e}"))),
        }
    }
}
