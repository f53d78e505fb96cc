use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid HTTP method: {method}")]
    InvalidMethod { method: String },

    #[error("{program} exited with code {code}: {stderr}")]
    NonZeroExit {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("{program} timed out after {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn invalid_method(method: impl Into<String>) -> Self {
        Self::InvalidMethod {
            method: method.into(),
        }
    }

    #[must_use]
    pub fn non_zero_exit(program: impl Into<String>, code: i32, stderr: impl Into<String>) -> Self {
        Self::NonZeroExit {
            program: program.into(),
            code,
            stderr: stderr.into(),
        }
    }

    #[must_use]
    pub fn timeout(program: impl Into<String>, timeout_secs: u64) -> Self {
        Self::Timeout {
            program: program.into(),
            timeout_secs,
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
