//! Ledger node client.
//!
//! [`LedgerClient`] is the seam the engine depends on: prepare transfers
//! into bundle trytes, then attach + broadcast them. [`NodeClient`] is the
//! production implementation speaking the node's JSON command API, with
//! proof-of-work performed locally via the injected provider.

use crate::bundle::{Transaction, Transfer, prepare_bundle, transaction_hash};
use crate::pow::PowFn;
use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use core_logic::NetworkError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

// Attachment timestamp bounds carried on every attached transaction.
const ATTACHMENT_TS_LOWER: i64 = 0;
const ATTACHMENT_TS_UPPER: i64 = 3_812_798_742_493;

#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Compose `transfers` into finalized bundle trytes, head first.
    async fn prepare_transfers(&self, seed: &str, transfers: &[Transfer]) -> Result<Vec<String>>;

    /// Attach the bundle to the tangle at `depth` with proof-of-work at
    /// `mwm`, broadcast it, and return the attached transactions.
    async fn send_trytes(
        &self,
        trytes: &[String],
        depth: u64,
        mwm: u64,
    ) -> Result<Vec<Transaction>>;
}

#[derive(Serialize)]
struct TipsRequest {
    command: &'static str,
    depth: u64,
}

#[derive(serde::Deserialize)]
struct TipsResponse {
    #[serde(rename = "trunkTransaction")]
    trunk_transaction: String,
    #[serde(rename = "branchTransaction")]
    branch_transaction: String,
}

#[derive(Serialize)]
struct TrytesRequest {
    command: &'static str,
    trytes: Vec<String>,
}

#[derive(serde::Deserialize)]
struct EmptyResponse {}

#[derive(serde::Deserialize)]
struct NodeErrorBody {
    error: Option<String>,
    exception: Option<String>,
}

/// JSON command API client for a ledger node.
pub struct NodeClient {
    endpoint: Url,
    http: reqwest::Client,
    pow: PowFn,
}

impl NodeClient {
    /// Deliberately no request timeout: an unresponsive node stalls the
    /// loop rather than failing it, matching the at-least-once posture.
    pub fn new(endpoint: Url, pow: PowFn) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            endpoint,
            http,
            pow,
        })
    }

    async fn call<B: Serialize, T: DeserializeOwned>(&self, body: &B) -> Result<T> {
        let endpoint = self.endpoint.to_string();
        let response = self
            .http
            .post(self.endpoint.clone())
            .header("X-IOTA-API-Version", "1")
            .json(body)
            .send()
            .await
            .map_err(|e| NetworkError::ConnectionFailed {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            // Nodes put the rejection reason in the error body
            let reason = response
                .json::<NodeErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.or(body.exception));
            return Err(match reason {
                Some(reason) => NetworkError::NodeRejected { endpoint, reason },
                None => NetworkError::HttpError {
                    status_code: status.as_u16(),
                    endpoint,
                },
            }
            .into());
        }

        response
            .json::<T>()
            .await
            .map_err(|e| {
                NetworkError::InvalidResponse {
                    endpoint,
                    reason: e.to_string(),
                }
                .into()
            })
    }

    async fn get_transactions_to_approve(&self, depth: u64) -> Result<TipsResponse> {
        self.call(&TipsRequest {
            command: "getTransactionsToApprove",
            depth,
        })
        .await
    }

    async fn broadcast_transactions(&self, trytes: Vec<String>) -> Result<()> {
        let _: EmptyResponse = self
            .call(&TrytesRequest {
                command: "broadcastTransactions",
                trytes,
            })
            .await?;
        Ok(())
    }

    async fn store_transactions(&self, trytes: Vec<String>) -> Result<()> {
        let _: EmptyResponse = self
            .call(&TrytesRequest {
                command: "storeTransactions",
                trytes,
            })
            .await?;
        Ok(())
    }

    /// Run the injected proof-of-work provider off the async runtime.
    async fn do_pow(&self, trytes: String, mwm: u64) -> Result<String> {
        let pow = self.pow.clone();
        tokio::task::spawn_blocking(move || pow(&trytes, mwm as usize))
            .await
            .context("Proof-of-work task panicked")?
    }
}

#[async_trait]
impl LedgerClient for NodeClient {
    async fn prepare_transfers(&self, seed: &str, transfers: &[Transfer]) -> Result<Vec<String>> {
        let timestamp = chrono::Utc::now().timestamp();
        prepare_bundle(seed, transfers, timestamp).context("Failed to prepare transfers")
    }

    async fn send_trytes(
        &self,
        trytes: &[String],
        depth: u64,
        mwm: u64,
    ) -> Result<Vec<Transaction>> {
        ensure!(!trytes.is_empty(), "nothing to send");

        let tips = self
            .get_transactions_to_approve(depth)
            .await
            .context("Tip selection failed")?;

        let mut transactions = trytes
            .iter()
            .map(|t| Transaction::from_trytes(t))
            .collect::<Result<Vec<_>>>()?;

        // Attach tail first: the tail approves both tips, every other
        // transaction approves its successor in the bundle plus the trunk tip.
        let mut previous_hash: Option<String> = None;
        let mut attached_trytes = vec![String::new(); transactions.len()];
        for (index, tx) in transactions.iter_mut().enumerate().rev() {
            match &previous_hash {
                None => {
                    tx.trunk = tips.trunk_transaction.clone();
                    tx.branch = tips.branch_transaction.clone();
                }
                Some(hash) => {
                    tx.trunk = hash.clone();
                    tx.branch = tips.trunk_transaction.clone();
                }
            }
            tx.attachment_timestamp = chrono::Utc::now().timestamp_millis();
            tx.attachment_timestamp_lower = ATTACHMENT_TS_LOWER;
            tx.attachment_timestamp_upper = ATTACHMENT_TS_UPPER;

            tx.nonce = self.do_pow(tx.to_trytes()?, mwm).await?;
            let final_trytes = tx.to_trytes()?;
            tx.hash = transaction_hash(&final_trytes)?;
            previous_hash = Some(tx.hash.clone());
            attached_trytes[index] = final_trytes;
        }

        self.broadcast_transactions(attached_trytes.clone())
            .await
            .context("Broadcast failed")?;
        self.store_transactions(attached_trytes)
            .await
            .context("Store failed")?;

        Ok(transactions)
    }
}
