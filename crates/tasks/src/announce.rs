//! Task that emits a fixed log line when it fires.

use {async_trait::async_trait, tracing::info};

use rota_dispatch::Task;

/// Logs a configured message at info level. Useful as a heartbeat and for
/// wiring checks before real jobs are added.
#[derive(Debug, Clone)]
pub struct AnnounceTask {
    message: String,
}

impl AnnounceTask {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Task for AnnounceTask {
    async fn run(&self) -> anyhow::Result<()> {
        info!(message = %self.message, "announcement");
        Ok(())
    }
}
