//! # Core Logic - Shared Utilities for Spammer Workers
//!
//! This crate provides the chain-agnostic pieces shared by the spammer
//! binaries: rolling throughput tracking, typed errors, the worker trait
//! and runner, and logger setup.
//!
//! ## Modules
//!
//! - [`error`] - Typed error handling with thiserror
//! - [`metrics`] - Rolling-window submission rate tracking
//! - [`traits`] - Core trait definitions
//! - [`utils`] - Logger and worker runner

// Module declarations - internal modules marked pub(crate)
pub mod error;
pub mod metrics;
pub mod traits;
pub(crate) mod utils;

// Selective exports - only public API types
pub use error::{ConfigError, CoreError, NetworkError};
pub use metrics::{RateTracker, Window};
pub use traits::{Spammer, SpammerStats};

// Utils are pub(crate) - only export specific public utilities
pub use utils::{setup_logger, WorkerRunner};
