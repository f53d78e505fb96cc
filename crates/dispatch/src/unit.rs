//! One concurrent run of a job's executable.

use std::sync::Arc;

use {
    chrono::{DateTime, Utc},
    tokio::task::JoinHandle,
    tracing::{error, info},
};

use crate::registry::Job;

/// A spawned execution of one job. Fire-and-forget: the dispatcher
/// polls `is_finished` and never consumes the task's result.
#[derive(Debug)]
pub struct ExecutionUnit {
    handle: JoinHandle<()>,
    started_at: DateTime<Utc>,
}

impl ExecutionUnit {
    /// Spawn the job's task on the runtime. The wrapper reports outcome
    /// and duration itself; a task failure never leaves the unit.
    #[must_use]
    pub fn launch(job: &Job) -> Self {
        let name = job.name.clone();
        let task = Arc::clone(&job.task);
        let handle = tokio::spawn(async move {
            let started = std::time::Instant::now();
            let result = task.run().await;
            let duration_ms = started.elapsed().as_millis() as u64;
            match result {
                Ok(()) => info!(job = %name, duration_ms, "job finished"),
                Err(e) => error!(job = %name, duration_ms, error = %e, "job failed"),
            }
        });
        Self {
            handle,
            started_at: Utc::now(),
        }
    }

    /// Non-blocking completion poll.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
