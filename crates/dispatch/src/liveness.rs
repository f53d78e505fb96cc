//! Per-job execution state, owned by the dispatch loop.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{registry::JobRegistry, unit::ExecutionUnit};

/// What the dispatcher knows about a job's current execution.
#[derive(Debug)]
pub enum ExecutionState {
    Idle,
    Running(ExecutionUnit),
}

/// One `ExecutionState` per registered job.
///
/// Single-writer: only the dispatch loop mutates it, so there is no
/// locking. Execution units never write back; the loop polls their
/// handles through `is_finished`.
#[derive(Debug)]
pub struct LivenessTracker {
    records: BTreeMap<String, ExecutionState>,
}

impl LivenessTracker {
    /// One `Idle` record per registry name.
    #[must_use]
    pub fn for_registry(registry: &JobRegistry) -> Self {
        let records = registry
            .names()
            .map(|name| (name.to_string(), ExecutionState::Idle))
            .collect();
        Self { records }
    }

    #[must_use]
    pub fn is_idle(&self, name: &str) -> bool {
        matches!(self.records.get(name), Some(ExecutionState::Idle))
    }

    /// Non-blocking poll: true when no live execution exists for `name`.
    /// Idle records and unknown names both count as finished.
    #[must_use]
    pub fn is_finished(&self, name: &str) -> bool {
        match self.records.get(name) {
            Some(ExecutionState::Running(unit)) => unit.is_finished(),
            Some(ExecutionState::Idle) | None => true,
        }
    }

    pub fn mark_running(&mut self, name: &str, unit: ExecutionUnit) {
        self.records
            .insert(name.to_string(), ExecutionState::Running(unit));
    }

    pub fn mark_idle(&mut self, name: &str) {
        self.records.insert(name.to_string(), ExecutionState::Idle);
    }

    /// Launch timestamp of the live execution, if one is running.
    #[must_use]
    pub fn started_at(&self, name: &str) -> Option<DateTime<Utc>> {
        match self.records.get(name) {
            Some(ExecutionState::Running(unit)) => Some(unit.started_at()),
            Some(ExecutionState::Idle) | None => None,
        }
    }

    /// Executions still in flight: `Running` records whose handle has
    /// not finished yet.
    #[must_use]
    pub fn running_count(&self) -> usize {
        self.records
            .values()
            .filter(|state| match state {
                ExecutionState::Running(unit) => !unit.is_finished(),
                ExecutionState::Idle => false,
            })
            .count()
    }
}
