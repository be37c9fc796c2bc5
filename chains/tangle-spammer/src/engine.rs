//! The spam engine: BUILD -> PREPARE -> SUBMIT -> RECORD, forever.
//!
//! Every iteration composes a fresh zero-value transfer from the static
//! configuration, prepares it into bundle trytes, submits it (the client
//! performs proof-of-work internally), and records the success in the
//! rate tracker. Any prepare or submit failure is logged and the loop
//! restarts immediately: no backoff, no retry cap, no distinction between
//! error kinds. Cancellation is the only exit.

use crate::bundle::Transfer;
use crate::client::LedgerClient;
use crate::config::{EXPLORER_URL, EngineConfig};
use anyhow::Result;
use async_trait::async_trait;
use core_logic::{RateTracker, Spammer, SpammerStats};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct SpamEngine<C: LedgerClient> {
    config: EngineConfig,
    client: C,
    tracker: RateTracker,
}

impl<C: LedgerClient> SpamEngine<C> {
    pub fn new(config: EngineConfig, client: C) -> Self {
        Self {
            config,
            client,
            tracker: RateTracker::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rate_tracker(&self) -> &RateTracker {
        &self.tracker
    }
}

#[async_trait]
impl<C: LedgerClient> Spammer for SpamEngine<C> {
    async fn start(&self, cancellation_token: CancellationToken) -> Result<SpammerStats> {
        let mut stats = SpammerStats::default();

        loop {
            if cancellation_token.is_cancelled() {
                return Ok(stats);
            }

            // BUILD: static, pre-validated configuration only
            let transfer = Transfer::zero_value(&self.config.address, &self.config.tag)?;

            // PREPARE
            let trytes = match self
                .client
                .prepare_transfers(&self.config.seed, std::slice::from_ref(&transfer))
                .await
            {
                Ok(trytes) => trytes,
                Err(e) => {
                    warn!(target: "spam_result", "Error preparing transfer: {:#}", e);
                    stats.failed += 1;
                    continue;
                }
            };

            // SUBMIT: proof-of-work happens inside the client
            let bundle = match self
                .client
                .send_trytes(&trytes, self.config.depth, self.config.mwm)
                .await
            {
                Ok(bundle) => bundle,
                Err(e) => {
                    warn!(target: "spam_result", "Error sending trytes: {:#}", e);
                    stats.failed += 1;
                    continue;
                }
            };

            // RECORD
            self.tracker.record(1);
            stats.success += 1;

            let hash = bundle.first().map(|tx| tx.hash.as_str()).unwrap_or("");
            info!(target: "spam_result", "SENT: {}/transaction/{}", EXPLORER_URL, hash);

            let (r1, r5, r15) = self.tracker.tps();
            info!(target: "spam_result", "TPS: {:.3} {:.3} {:.3}", r1, r5, r15);
        }
    }
}
