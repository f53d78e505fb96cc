//! Config schema: dispatcher settings and the job table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RotaConfig {
    pub dispatcher: DispatcherConfig,
    pub jobs: Vec<JobConfig>,
}

/// Dispatcher-wide settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Default IANA timezone for jobs that do not set their own.
    /// Schedules evaluate in UTC when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

/// One scheduled job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Unique job name; duplicates are rejected at startup.
    pub name: String,
    /// Cron expression: five-field, a form with seconds, or an alias
    /// such as `@hourly`.
    #[serde(default = "default_schedule")]
    pub schedule: String,
    /// IANA timezone overriding the dispatcher default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Disabled jobs stay in the file but are never registered.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// What the job runs.
    pub task: TaskSpec,
}

/// A job's executable payload, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TaskSpec {
    /// Spawn a program with arguments.
    Command {
        program: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: HashMap<String, String>,
        /// Kill the program after this many seconds. Unset means the run
        /// may take as long as it likes; fires that land while it is
        /// still going are skipped.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeout_secs: Option<u64>,
    },
    /// Write a message to the log.
    Announce { message: String },
    /// Fire an HTTP request and require a 2xx response.
    Http {
        url: String,
        #[serde(default = "default_http_method")]
        method: String,
        #[serde(default = "default_http_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_schedule() -> String {
    "@hourly".to_string()
}

fn default_true() -> bool {
    true
}

fn default_http_method() -> String {
    "GET".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}
