use anyhow::{Context, Result};
use clap::Parser;
use core_logic::{WorkerRunner, setup_logger};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tangle_spammer::config::{Args, EXPLORER_URL, EngineConfig};
use tangle_spammer::engine::SpamEngine;
use tangle_spammer::{NodeClient, fastest_pow_impl};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_guard = setup_logger();
    // Keep guard alive for file logging until process exit
    std::mem::forget(log_guard);

    // Resolve the proof-of-work provider once; its name feeds the tag
    let (pow_name, pow_fn) = fastest_pow_impl();

    // The random source only touches startup identity generation
    let mut rng = StdRng::from_entropy();
    let config = EngineConfig::from_args(args, &pow_name, &mut rng)
        .context("Failed to build engine configuration")?;

    info!(target: "spam_result", "Using node: {}", config.node);
    info!(target: "spam_result", "Using PoW: {}", pow_name);
    info!(target: "spam_result", "Using tag: {}/tag/{}", EXPLORER_URL, config.tag);
    info!(
        target: "spam_result",
        "Using address: {}/address/{}",
        EXPLORER_URL,
        config.bare_address()
    );

    let client = NodeClient::new(config.node.clone(), pow_fn)?;
    let engine = SpamEngine::new(config, client);

    WorkerRunner::run_spammers(vec![Box::new(engine)]).await
}
