//! Built-in task implementations and config-to-registry assembly.
//!
//! Three task kinds ship with the dispatcher: spawning a program,
//! logging an announcement, and probing an HTTP endpoint.

pub mod announce;
pub mod command;
pub mod error;
pub mod http;

use std::{sync::Arc, time::Duration};

use tracing::info;

use {
    rota_config::{RotaConfig, TaskSpec},
    rota_dispatch::{Job, JobRegistry, Task},
};

pub use {
    announce::AnnounceTask,
    command::CommandTask,
    error::{Error, Result},
    http::HttpTask,
};

/// Instantiate the task described by a config entry.
pub fn build_task(spec: &TaskSpec) -> Result<Arc<dyn Task>> {
    match spec {
        TaskSpec::Command {
            program,
            args,
            env,
            timeout_secs,
        } => {
            let mut task = CommandTask::new(program)
                .with_args(args.clone())
                .with_env(env.clone());
            if let Some(secs) = timeout_secs {
                task = task.with_timeout(Duration::from_secs(*secs));
            }
            Ok(Arc::new(task))
        },
        TaskSpec::Announce { message } => Ok(Arc::new(AnnounceTask::new(message))),
        TaskSpec::Http {
            url,
            method,
            timeout_secs,
        } => Ok(Arc::new(HttpTask::new(url, method, *timeout_secs)?)),
    }
}

/// Turn a parsed config into a job registry. Disabled jobs are skipped;
/// jobs without their own timezone inherit the dispatcher's.
pub fn registry_from_config(config: &RotaConfig) -> anyhow::Result<JobRegistry> {
    let mut registry = JobRegistry::new();
    for entry in &config.jobs {
        if !entry.enabled {
            info!(job = %entry.name, "job disabled, skipping");
            continue;
        }
        let task = build_task(&entry.task)?;
        let mut job = Job::new(&entry.name, &entry.schedule, task);
        if let Some(tz) = entry
            .timezone
            .clone()
            .or_else(|| config.dispatcher.timezone.clone())
        {
            job = job.with_timezone(tz);
        }
        registry.register(job)?;
    }
    Ok(registry)
}
