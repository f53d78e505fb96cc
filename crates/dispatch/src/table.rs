//! The per-cycle schedule table.

use std::collections::BTreeMap;

use {
    chrono::{DateTime, Utc},
    tracing::warn,
};

use crate::{registry::JobRegistry, schedule};

/// Next-fire instants for one wake cycle, instant → job names.
///
/// Rebuilt in full from the registry at the top of every cycle and
/// consumed when due entries are collected, never patched in place.
/// Jobs landing on the same instant all keep their entry.
#[derive(Debug, Default)]
pub struct ScheduleTable {
    entries: BTreeMap<DateTime<Utc>, Vec<String>>,
}

impl ScheduleTable {
    /// Build a fresh table from every job in the registry.
    ///
    /// A job whose schedule fails to evaluate, or has no future
    /// occurrence, is left out for this cycle and reported; the next
    /// rebuild retries it.
    #[must_use]
    pub fn build(registry: &JobRegistry, now: DateTime<Utc>) -> Self {
        let mut entries: BTreeMap<DateTime<Utc>, Vec<String>> = BTreeMap::new();
        for job in registry.iter() {
            match schedule::next_occurrence(&job.schedule, job.timezone.as_deref(), now) {
                Ok(Some(at)) => {
                    entries.entry(at).or_default().push(job.name.clone());
                },
                Ok(None) => {
                    warn!(
                        job = %job.name,
                        schedule = %job.schedule,
                        "schedule has no future occurrence, skipping this cycle"
                    );
                },
                Err(e) => {
                    warn!(job = %job.name, error = %e, "schedule failed to evaluate, skipping this cycle");
                },
            }
        }
        Self { entries }
    }

    /// The earliest scheduled instant, if any job made it into the table.
    #[must_use]
    pub fn earliest(&self) -> Option<DateTime<Utc>> {
        self.entries.keys().next().copied()
    }

    /// Number of scheduled entries. Coincident jobs count individually.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the table, returning the names due at or before `now` in
    /// ascending instant order. Entries past `now` are discarded with the
    /// table; the caller rebuilds from the registry next cycle.
    #[must_use]
    pub fn into_due(self, now: DateTime<Utc>) -> Vec<String> {
        self.entries
            .into_iter()
            .take_while(|(at, _)| *at <= now)
            .flat_map(|(_, names)| names)
            .collect()
    }
}
