//! JSON file backend
//!
//! The whole collection lives in one pretty-printed JSON document,
//! `{"highWater": n, "tickets": [...]}`. A bare ticket array, as written by
//! earlier versions, is still accepted on load. Flushes write a sibling temp
//! file, fsync it and rename it over the target, so readers only ever see
//! the previous or the next complete collection.

use super::lock::StoreLock;
use super::persistence::{Persistence, Snapshot};
use crate::core::Ticket;
use crate::error::{LostFoundError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentRef<'a> {
    high_water: u64,
    tickets: &'a [Ticket],
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    #[serde(default)]
    high_water: u64,
    tickets: Vec<Ticket>,
}

/// File-backed persistence adapter
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    _lock: StoreLock,
}

impl FileStorage {
    /// Open the data file at `path`, taking ownership through its lock file
    ///
    /// The data file itself is not created until the first flush.
    pub fn open(path: impl Into<PathBuf>, lock_timeout: Duration) -> Result<Self> {
        let path = path.into();
        let lock = StoreLock::acquire(&lock_path(&path), lock_timeout)?;
        tracing::debug!(path = %path.display(), "opened ticket file");
        Ok(Self { path, _lock: lock })
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn corrupt(&self, message: impl Into<String>) -> LostFoundError {
        LostFoundError::CorruptState {
            path: self.path.clone(),
            message: message.into(),
        }
    }

    fn write_atomically(
        &self,
        tickets: &[Ticket],
        high_water: u64,
        deadline: Option<Instant>,
    ) -> Result<()> {
        let dir = self.directory();
        fs::create_dir_all(dir).map_err(|e| persistence_io("create data directory", &e))?;

        let mut temp =
            NamedTempFile::new_in(dir).map_err(|e| persistence_io("create temp file", &e))?;
        let document = DocumentRef {
            high_water,
            tickets,
        };
        serde_json::to_writer_pretty(temp.as_file_mut(), &document)
            .map_err(|e| LostFoundError::Persistence(format!("encode tickets: {e}")))?;
        temp.as_file_mut()
            .write_all(b"\n")
            .and_then(|()| temp.as_file().sync_all())
            .map_err(|e| persistence_io("sync temp file", &e))?;

        if deadline.is_some_and(|d| Instant::now() >= d) {
            // Dropping `temp` removes it; the previous collection stays in place.
            return Err(LostFoundError::Persistence(
                "flush deadline passed before commit".to_string(),
            ));
        }

        temp.persist(&self.path)
            .map_err(|e| persistence_io("rename temp file", &e.error))?;
        sync_directory(dir);

        tracing::debug!(
            path = %self.path.display(),
            count = tickets.len(),
            high_water,
            "flushed tickets"
        );
        Ok(())
    }
}

impl Persistence for FileStorage {
    fn load(&self) -> Result<Snapshot> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no ticket file yet, starting empty");
                return Ok(Snapshot::default());
            },
            Err(e) => return Err(persistence_io("read ticket file", &e)),
        };

        if bytes.is_empty() {
            return Ok(Snapshot::default());
        }

        let (tickets, high_water) = if bytes.trim_ascii_start().starts_with(b"[") {
            let tickets: Vec<Ticket> =
                serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e.to_string()))?;
            (tickets, 0)
        } else {
            let document: Document =
                serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e.to_string()))?;
            (document.tickets, document.high_water)
        };

        let mut seen = HashSet::with_capacity(tickets.len());
        for ticket in &tickets {
            if !seen.insert(&ticket.id) {
                return Err(self.corrupt(format!("duplicate ticket id {}", ticket.id)));
            }
            if ticket.items.is_empty() {
                return Err(self.corrupt(format!("ticket {} has no items", ticket.id)));
            }
        }

        let snapshot = Snapshot::new(tickets, high_water);
        tracing::info!(
            path = %self.path.display(),
            count = snapshot.tickets.len(),
            high_water = snapshot.high_water,
            "loaded tickets"
        );
        Ok(snapshot)
    }

    fn flush(&self, tickets: &[Ticket], high_water: u64) -> Result<()> {
        self.write_atomically(tickets, high_water, None)
    }

    fn flush_before(&self, tickets: &[Ticket], high_water: u64, deadline: Instant) -> Result<()> {
        self.write_atomically(tickets, high_water, Some(deadline))
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "tickets.json".into());
    name.push(".lock");
    path.with_file_name(name)
}

fn persistence_io(action: &str, err: &io::Error) -> LostFoundError {
    LostFoundError::Persistence(format!("{action}: {err}"))
}

#[cfg(unix)]
fn sync_directory(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        tracing::warn!(dir = %dir.display(), error = %e, "could not sync data directory");
    }
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) {}
