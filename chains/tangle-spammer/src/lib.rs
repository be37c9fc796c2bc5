//! Tangle Spammer - Zero-value transaction spammer for the tangle
//!
//! Continuously builds zero-value transfers, performs local proof-of-work,
//! submits the bundles to a remote node, and reports rolling 1/5/15-minute
//! throughput. Built on the shared `core-logic` worker framework.
//!
//! # Architecture
//!
//! - **[`SpamEngine`]**: the perpetual BUILD/PREPARE/SUBMIT/RECORD loop
//!   with unbounded immediate retry on any failure
//! - **[`NodeClient`]**: JSON command API client ([`LedgerClient`] seam)
//!   with locally executed proof-of-work
//! - **[`pow`]**: proof-of-work provider registry, fastest resolved once
//!   at startup
//! - **[`bundle`]** / **[`trinary`]** / **[`curl`]**: transfer and bundle
//!   construction over the ternary wire format
//!
//! # Quick Start
//!
//! ```bash
//! # Spam a local node with the defaults (MWM 14, depth 1)
//! cargo run -p tangle-spammer
//!
//! # Lower difficulty against a private testnet node
//! cargo run -p tangle-spammer -- --node http://localhost:14265 --mwm 9
//! ```

pub mod bundle;
pub mod client;
pub mod config;
pub mod curl;
pub mod engine;
pub mod pow;
pub mod trinary;

pub use bundle::{Transaction, Transfer};
pub use client::{LedgerClient, NodeClient};
pub use config::{Args, EngineConfig};
pub use engine::SpamEngine;
pub use pow::{PowFn, fastest_pow_impl};
