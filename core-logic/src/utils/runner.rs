use crate::traits::Spammer;
use anyhow::Result;
use tokio::signal;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Instrument};

pub struct WorkerRunner;

impl WorkerRunner {
    /// Spawns the spammers as concurrent tasks and waits for them.
    ///
    /// A Ctrl+C listener cancels the shared token; each spammer drains its
    /// current iteration and returns its stats, which are aggregated into
    /// the shutdown summary.
    pub async fn run_spammers(spammers: Vec<Box<dyn Spammer>>) -> Result<()> {
        let mut set = JoinSet::new();

        let token = CancellationToken::new();
        let cloned_token = token.clone();

        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!(target: "spam_result", "Received Ctrl+C. Initiating graceful shutdown...");
                    cloned_token.cancel();
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });

        let start_time = std::time::Instant::now();

        for (i, spammer) in spammers.into_iter().enumerate() {
            let id = i + 1;
            let span = tracing::info_span!("worker", worker_id = format!("{:03}", id));
            let child_token = token.clone();

            set.spawn(
                async move {
                    match spammer.start(child_token).await {
                        Ok(stats) => Ok(stats),
                        Err(e) => {
                            error!("Worker {} failed: {:?}", id, e);
                            Err(e)
                        }
                    }
                }
                .instrument(span),
            );
        }

        let mut total_success = 0;
        let mut total_failed = 0;

        while let Some(res) = set.join_next().await {
            match res {
                Ok(Ok(stats)) => {
                    total_success += stats.success;
                    total_failed += stats.failed;
                }
                Ok(Err(_)) => {
                    // Already logged in the worker
                }
                Err(e) => {
                    error!("A worker task panicked or failed to join: {:?}", e);
                }
            }
        }

        let total_duration = start_time.elapsed();
        info!(
            target: "spam_result",
            "Shutdown complete. Uptime: {:.1}s | Submitted: {} | Failed attempts: {}",
            total_duration.as_secs_f64(),
            total_success,
            total_failed
        );

        Ok(())
    }
}
