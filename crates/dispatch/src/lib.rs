//! Cron-driven job dispatch.
//!
//! A fixed registry of named jobs, a schedule table rebuilt every wake
//! cycle, and at most one live execution per job at any time.

pub mod dispatcher;
pub mod error;
pub mod liveness;
pub mod registry;
pub mod schedule;
pub mod table;
pub mod task;
pub mod unit;

pub use {
    dispatcher::Dispatcher,
    error::{Error, Result},
    liveness::{ExecutionState, LivenessTracker},
    registry::{Job, JobRegistry},
    schedule::next_occurrence,
    table::ScheduleTable,
    task::Task,
    unit::ExecutionUnit,
};
