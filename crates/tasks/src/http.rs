//! Task that probes an HTTP endpoint.

use std::time::Duration;

use {async_trait::async_trait, tracing::debug};

use {
    crate::error::{Error, Result},
    rota_dispatch::Task,
};

/// Sends a single request and succeeds on any 2xx response.
#[derive(Debug, Clone)]
pub struct HttpTask {
    url: String,
    method: reqwest::Method,
    client: reqwest::Client,
}

impl HttpTask {
    /// Method and timeout are checked eagerly so a bad value fails at
    /// assembly instead of on the first firing.
    pub fn new(url: impl Into<String>, method: &str, timeout_secs: u64) -> Result<Self> {
        let parsed = method
            .to_uppercase()
            .parse::<reqwest::Method>()
            .map_err(|_| Error::invalid_method(method))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            url: url.into(),
            method: parsed,
            client,
        })
    }

    async fn execute(&self) -> Result<()> {
        let response = self
            .client
            .request(self.method.clone(), self.url.as_str())
            .send()
            .await?
            .error_for_status()?;
        debug!(url = %self.url, status = %response.status(), "http probe done");
        Ok(())
    }
}

#[async_trait]
impl Task for HttpTask {
    async fn run(&self) -> anyhow::Result<()> {
        Ok(self.execute().await?)
    }
}
