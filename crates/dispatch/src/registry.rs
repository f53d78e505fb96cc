//! The immutable job registry.

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    error::{Error, Result},
    task::Task,
};

/// A job descriptor: unique name, cron expression, optional IANA
/// timezone, and the executable to run. Descriptors never change after
/// registration.
#[derive(Clone)]
pub struct Job {
    pub name: String,
    pub schedule: String,
    pub timezone: Option<String>,
    pub task: Arc<dyn Task>,
}

impl Job {
    #[must_use]
    pub fn new(name: impl Into<String>, schedule: impl Into<String>, task: Arc<dyn Task>) -> Self {
        Self {
            name: name.into(),
            schedule: schedule.into(),
            timezone: None,
            task,
        }
    }

    /// Evaluate the schedule in this IANA timezone instead of UTC.
    #[must_use]
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("schedule", &self.schedule)
            .field("timezone", &self.timezone)
            .finish_non_exhaustive()
    }
}

/// The full set of jobs, fixed for the lifetime of the process.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: BTreeMap<String, Job>,
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a job. Names are unique; a second registration is rejected.
    pub fn register(&mut self, job: Job) -> Result<()> {
        if self.jobs.contains_key(&job.name) {
            return Err(Error::duplicate_job(job.name));
        }
        self.jobs.insert(job.name.clone(), job);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Job> {
        self.jobs.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}
