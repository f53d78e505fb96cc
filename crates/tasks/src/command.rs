//! Task that spawns an external program and waits for it to exit.

use std::{collections::HashMap, process::Stdio, time::Duration};

use {
    async_trait::async_trait,
    tokio::process::Command,
    tracing::{debug, warn},
};

use {
    crate::error::{Error, Result},
    rota_dispatch::Task,
};

/// Upper bound on the stderr excerpt carried in a failure.
const MAX_STDERR_BYTES: usize = 4096;

/// Runs `program` with arguments and extra environment, optionally bounded
/// by a timeout. Success is exit code zero.
#[derive(Debug, Clone)]
pub struct CommandTask {
    program: String,
    args: Vec<String>,
    env: HashMap<String, String>,
    timeout: Option<Duration>,
}

impl CommandTask {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: HashMap::new(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn execute(&self) -> Result<()> {
        debug!(program = %self.program, args = ?self.args, "spawning command");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        // Prevent the child from inheriting stdin.
        cmd.stdin(Stdio::null());
        // Reap the child if the timeout drops the wait future.
        cmd.kill_on_drop(true);

        let child = cmd.spawn()?;

        let output = match self.timeout {
            Some(timeout) => {
                match tokio::time::timeout(timeout, child.wait_with_output()).await {
                    Ok(result) => result?,
                    Err(_) => {
                        warn!(
                            program = %self.program,
                            timeout_secs = timeout.as_secs(),
                            "command timed out"
                        );
                        return Err(Error::timeout(&self.program, timeout.as_secs()));
                    },
                }
            },
            None => child.wait_with_output().await?,
        };

        if output.status.success() {
            debug!(
                program = %self.program,
                stdout_len = output.stdout.len(),
                stderr_len = output.stderr.len(),
                "command done"
            );
            return Ok(());
        }

        let code = output.status.code().unwrap_or(-1);
        let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        truncate_output(&mut stderr, MAX_STDERR_BYTES);
        Err(Error::non_zero_exit(&self.program, code, stderr.trim()))
    }
}

#[async_trait]
impl Task for CommandTask {
    async fn run(&self) -> anyhow::Result<()> {
        Ok(self.execute().await?)
    }
}

/// Truncate at a char boundary and mark the cut.
fn truncate_output(s: &mut String, max_bytes: usize) {
    if s.len() <= max_bytes {
        return;
    }
    let mut cut = max_bytes;
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
    s.push_str("\n... [output truncated]");
}
