//! The executable seam between the dispatcher and job content.

use async_trait::async_trait;

/// A job's executable: zero-argument async work.
///
/// The dispatcher never inspects the result. A returned error is the
/// execution wrapper's to report; the only thing fed back into
/// scheduling is whether the run has finished.
#[async_trait]
pub trait Task: Send + Sync {
    async fn run(&self) -> anyhow::Result<()>;
}
