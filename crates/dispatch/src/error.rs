use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid cron expression '{expr}': {source}")]
    InvalidSchedule {
        expr: String,
        #[source]
        source: cron::error::Error,
    },

    #[error("unknown timezone: {timezone}")]
    UnknownTimezone { timezone: String },

    #[error("no runnable jobs in the registry")]
    NoJobs,

    #[error("job not found: {name}")]
    JobNotFound { name: String },

    #[error("duplicate job name: {name}")]
    DuplicateJob { name: String },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn invalid_schedule(expr: impl Into<String>, source: cron::error::Error) -> Self {
        Self::InvalidSchedule {
            expr: expr.into(),
            source,
        }
    }

    #[must_use]
    pub fn unknown_timezone(timezone: impl Into<String>) -> Self {
        Self::UnknownTimezone {
            timezone: timezone.into(),
        }
    }

    #[must_use]
    pub fn job_not_found(name: impl Into<String>) -> Self {
        Self::JobNotFound { name: name.into() }
    }

    #[must_use]
    pub fn duplicate_job(name: impl Into<String>) -> Self {
        Self::DuplicateJob { name: name.into() }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
