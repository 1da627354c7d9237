//! Advisory lock guarding ownership of a data file

use crate::error::{LostFoundError, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// RAII guard for an exclusive lock on `<data file>.lock`
///
/// Held for the lifetime of a [`super::FileStorage`]; released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Acquire the lock, retrying until `timeout` elapses
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)?;

        let start = Instant::now();
        loop {
            if file.try_lock_exclusive().is_ok() {
                tracing::debug!(path = %path.display(), "acquired store lock");
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(LostFoundError::LockContention {
                    path: path.to_path_buf(),
                });
            }

            thread::sleep(RETRY_INTERVAL);
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            tracing::warn!(path = %self.path.display(), error = %e, "could not release store lock");
        } else {
            tracing::debug!(path = %self.path.display(), "released store lock");
        }
    }
}
