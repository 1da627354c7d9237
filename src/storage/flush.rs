//! Bounded flushing
//!
//! Without a timeout a flush runs on the caller's thread. With one, flushes
//! are handed to a single worker thread and the caller waits at most the
//! timeout. The worker receives the deadline so a backend can refuse to
//! commit a write whose caller already gave up on it.

use super::persistence::Persistence;
use crate::core::Ticket;
use crate::error::{LostFoundError, Result};
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

struct FlushJob {
    tickets: Arc<Vec<Ticket>>,
    high_water: u64,
    deadline: Instant,
    reply: mpsc::Sender<Result<()>>,
}

/// Runs flushes against a persistence backend
pub(crate) struct Flusher {
    backend: Arc<dyn Persistence>,
    worker: Option<(mpsc::Sender<FlushJob>, Duration)>,
}

impl Flusher {
    /// Create a flusher; spawns the worker thread when `timeout` is set
    pub(crate) fn new(backend: Arc<dyn Persistence>, timeout: Option<Duration>) -> Result<Self> {
        let worker = match timeout {
            Some(timeout) => Some((spawn_worker(Arc::clone(&backend))?, timeout)),
            None => None,
        };
        Ok(Self { backend, worker })
    }

    pub(crate) fn backend(&self) -> &Arc<dyn Persistence> {
        &self.backend
    }

    /// Durably write `tickets` and `high_water`, failing with `FlushTimeout`
    /// past the bound
    pub(crate) fn flush(&self, tickets: &Arc<Vec<Ticket>>, high_water: u64) -> Result<()> {
        let Some((jobs, timeout)) = &self.worker else {
            return self.backend.flush(tickets, high_water);
        };

        let (reply, response) = mpsc::channel();
        let job = FlushJob {
            tickets: Arc::clone(tickets),
            high_water,
            deadline: Instant::now() + *timeout,
            reply,
        };
        jobs.send(job)
            .map_err(|_| LostFoundError::Persistence("flush worker has stopped".to_string()))?;

        match response.recv_timeout(*timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(timeout = ?timeout, "flush timed out");
                Err(LostFoundError::FlushTimeout(*timeout))
            },
            Err(RecvTimeoutError::Disconnected) => Err(LostFoundError::Persistence(
                "flush worker terminated".to_string(),
            )),
        }
    }
}

fn spawn_worker(backend: Arc<dyn Persistence>) -> Result<mpsc::Sender<FlushJob>> {
    let (jobs, queue) = mpsc::channel::<FlushJob>();
    thread::Builder::new()
        .name("lost-found-flush".to_string())
        .spawn(move || {
            for job in queue {
                let result = if Instant::now() >= job.deadline {
                    Err(LostFoundError::Persistence(
                        "flush expired while queued".to_string(),
                    ))
                } else {
                    backend.flush_before(&job.tickets, job.high_water, job.deadline)
                };
                // The caller may have timed out and dropped its receiver.
                let _ = job.reply.send(result);
            }
            tracing::debug!("flush worker exiting");
        })?;
    Ok(jobs)
}
