use anyhow::{Result, bail};
use async_trait::async_trait;
use clap::Parser;
use core_logic::{Spammer, Window};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tangle_spammer::bundle::{Transaction, Transfer};
use tangle_spammer::client::LedgerClient;
use tangle_spammer::config::{Args, EngineConfig};
use tangle_spammer::engine::SpamEngine;
use tangle_spammer::trinary::TRYTES_PER_TRANSACTION;
use tokio_util::sync::CancellationToken;

fn test_config() -> EngineConfig {
    let mut rng = StdRng::seed_from_u64(99);
    let args = Args::try_parse_from(["tangle-spammer", "--mwm", "1"]).unwrap();
    EngineConfig::from_args(args, "SEQUENTIAL", &mut rng).unwrap()
}

fn mock_bundle() -> Vec<Transaction> {
    let mut tx = Transaction::from_trytes(&"9".repeat(TRYTES_PER_TRANSACTION)).unwrap();
    tx.hash = "MOCKBUNDLEHASH".to_string() + &"9".repeat(67);
    vec![tx]
}

/// Scripted ledger client: fails a configured number of prepare and send
/// calls, then succeeds, cancelling the token so the engine loop exits.
struct MockClient {
    prepare_calls: Arc<AtomicUsize>,
    send_calls: Arc<AtomicUsize>,
    prepare_failures: usize,
    send_failures: usize,
    cancel_after_calls: Option<usize>,
    token: CancellationToken,
}

impl MockClient {
    fn new(token: CancellationToken) -> Self {
        Self {
            prepare_calls: Arc::new(AtomicUsize::new(0)),
            send_calls: Arc::new(AtomicUsize::new(0)),
            prepare_failures: 0,
            send_failures: 0,
            cancel_after_calls: None,
            token,
        }
    }
}

#[async_trait]
impl LedgerClient for MockClient {
    async fn prepare_transfers(&self, _seed: &str, transfers: &[Transfer]) -> Result<Vec<String>> {
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].value, 0, "engine must only build zero-value transfers");

        let call = self.prepare_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(limit) = self.cancel_after_calls {
            if call >= limit {
                self.token.cancel();
            }
        }
        if call <= self.prepare_failures {
            bail!("node-side validation failure");
        }
        Ok(vec!["9".repeat(TRYTES_PER_TRANSACTION)])
    }

    async fn send_trytes(
        &self,
        trytes: &[String],
        depth: u64,
        mwm: u64,
    ) -> Result<Vec<Transaction>> {
        assert_eq!(depth, 1);
        assert_eq!(mwm, 1);
        assert_eq!(trytes.len(), 1);

        let call = self.send_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.send_failures {
            bail!("network failure");
        }
        // Success ends the test run
        self.token.cancel();
        Ok(mock_bundle())
    }
}

#[tokio::test]
async fn test_prepare_failures_retry_unbounded() {
    let token = CancellationToken::new();
    let mut client = MockClient::new(token.clone());
    client.prepare_failures = usize::MAX;
    client.cancel_after_calls = Some(25);
    let prepare_calls = client.prepare_calls.clone();
    let send_calls = client.send_calls.clone();

    let engine = SpamEngine::new(test_config(), client);
    let stats = engine.start(token).await.unwrap();

    assert!(prepare_calls.load(Ordering::SeqCst) >= 25);
    assert_eq!(send_calls.load(Ordering::SeqCst), 0);
    assert!(stats.failed >= 25);
    assert_eq!(stats.success, 0);
    assert_eq!(engine.rate_tracker().rate(Window::OneMinute), 0);
}

#[tokio::test]
async fn test_send_failure_does_not_touch_tracker() {
    let token = CancellationToken::new();
    let mut client = MockClient::new(token.clone());
    client.send_failures = usize::MAX;
    client.cancel_after_calls = Some(5);
    let prepare_calls = client.prepare_calls.clone();
    let send_calls = client.send_calls.clone();

    let engine = SpamEngine::new(test_config(), client);
    let stats = engine.start(token).await.unwrap();

    // Every prepare was followed by exactly one (failed) send
    assert_eq!(
        prepare_calls.load(Ordering::SeqCst),
        send_calls.load(Ordering::SeqCst)
    );
    assert_eq!(stats.success, 0);
    assert!(stats.failed >= 5);
    assert_eq!(engine.rate_tracker().rate(Window::OneMinute), 0);
}

#[tokio::test]
async fn test_success_records_exactly_once() {
    let token = CancellationToken::new();
    let client = MockClient::new(token.clone());
    let prepare_calls = client.prepare_calls.clone();
    let send_calls = client.send_calls.clone();

    let engine = SpamEngine::new(test_config(), client);
    let stats = engine.start(token).await.unwrap();

    assert_eq!(prepare_calls.load(Ordering::SeqCst), 1);
    assert_eq!(send_calls.load(Ordering::SeqCst), 1);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.failed, 0);

    for window in Window::ALL {
        assert_eq!(engine.rate_tracker().rate(window), 1);
    }
}

#[tokio::test]
async fn test_success_on_third_attempt_end_to_end() {
    let token = CancellationToken::new();
    let mut client = MockClient::new(token.clone());
    client.send_failures = 2;
    let prepare_calls = client.prepare_calls.clone();
    let send_calls = client.send_calls.clone();

    let engine = SpamEngine::new(test_config(), client);
    let stats = engine.start(token).await.unwrap();

    assert_eq!(prepare_calls.load(Ordering::SeqCst), 3);
    assert_eq!(send_calls.load(Ordering::SeqCst), 3);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.success, 1);
    assert_eq!(engine.rate_tracker().rate(Window::OneMinute), 1);
}

#[tokio::test]
async fn test_cancelled_token_exits_before_any_call() {
    let token = CancellationToken::new();
    token.cancel();

    let client = MockClient::new(token.clone());
    let prepare_calls = client.prepare_calls.clone();

    let engine = SpamEngine::new(test_config(), client);
    let stats = engine.start(token).await.unwrap();

    assert_eq!(prepare_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stats.success + stats.failed, 0);
}
