use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Totals accumulated by a spammer over its lifetime.
#[derive(Debug, Default, Clone)]
pub struct SpammerStats {
    pub success: u64,
    pub failed: u64,
}

#[async_trait]
pub trait Spammer: Send + Sync {
    /// Run the submission loop until the token is cancelled.
    ///
    /// Implementations never exit on their own during normal operation;
    /// cancellation is the only way out of the steady-state loop.
    async fn start(&self, cancellation_token: CancellationToken) -> Result<SpammerStats>;
}
