//! Proof-of-work providers.
//!
//! A provider is a named callable: transaction trytes + minimum weight
//! magnitude in, 27-tryte nonce out, such that the Curl hash of the
//! nonced transaction ends in at least MWM zero trits. The fastest
//! available implementation is resolved once at startup and injected
//! into the ledger client; its name also feeds the default tag.

use crate::curl::curl_hash;
use crate::trinary::{
    HASH_TRITS, NONCE_TRIT_OFFSET, TRYTES_PER_TRANSACTION, trailing_zeros, trits_from_trytes,
    trytes_from_trits,
};
use anyhow::{Result, bail, ensure};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

pub type PowFn = Arc<dyn Fn(&str, usize) -> Result<String> + Send + Sync>;

/// All registered provider implementations, slowest first.
pub fn available_impls() -> Vec<(&'static str, PowFn)> {
    vec![
        ("SEQUENTIAL", Arc::new(sequential_pow) as PowFn),
        ("THREADED", Arc::new(threaded_pow) as PowFn),
    ]
}

/// Resolve the fastest provider for this host, once, at startup.
///
/// The threaded search wins whenever more than one core is available;
/// otherwise the single-thread search avoids pointless thread churn.
pub fn fastest_pow_impl() -> (String, PowFn) {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let name = if cores > 1 { "THREADED" } else { "SEQUENTIAL" };
    let (_, pow) = available_impls()
        .into_iter()
        .find(|(n, _)| *n == name)
        .expect("registered provider");
    (name.to_string(), pow)
}

fn check_pow_input(trytes: &str, mwm: usize) -> Result<()> {
    ensure!(
        trytes.len() == TRYTES_PER_TRANSACTION,
        "expected {} transaction trytes, got {}",
        TRYTES_PER_TRANSACTION,
        trytes.len()
    );
    ensure!(
        mwm <= HASH_TRITS,
        "minimum weight magnitude {} exceeds hash length {}",
        mwm,
        HASH_TRITS
    );
    Ok(())
}

/// Balanced-ternary increment over a trit slice. Returns false once the
/// whole space has wrapped around.
fn increment_trits(trits: &mut [i8]) -> bool {
    for trit in trits.iter_mut() {
        if *trit == 1 {
            *trit = -1;
        } else {
            *trit += 1;
            return true;
        }
    }
    false
}

/// Single-thread incremental nonce search.
pub fn sequential_pow(trytes: &str, mwm: usize) -> Result<String> {
    check_pow_input(trytes, mwm)?;
    let mut trits = trits_from_trytes(trytes)?;
    for trit in &mut trits[NONCE_TRIT_OFFSET..] {
        *trit = 0;
    }
    loop {
        let hash = curl_hash(&trits);
        if trailing_zeros(&hash) >= mwm {
            return Ok(trytes_from_trits(&trits[NONCE_TRIT_OFFSET..]));
        }
        if !increment_trits(&mut trits[NONCE_TRIT_OFFSET..]) {
            bail!("nonce space exhausted without satisfying MWM {}", mwm);
        }
    }
}

// Trits reserved per worker to partition the nonce space; 3^6 = 729
// distinct prefixes is plenty for any realistic core count.
const WORKER_PREFIX_TRITS: usize = 6;

/// Multi-thread nonce search: each worker owns a distinct nonce prefix
/// and increments the remainder; first valid nonce wins.
pub fn threaded_pow(trytes: &str, mwm: usize) -> Result<String> {
    check_pow_input(trytes, mwm)?;
    let base_trits = trits_from_trytes(trytes)?;
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let found = AtomicBool::new(false);
    let result: Mutex<Option<String>> = Mutex::new(None);

    std::thread::scope(|scope| {
        for worker in 0..workers {
            let base = &base_trits;
            let found = &found;
            let result = &result;
            scope.spawn(move || {
                let mut trits = base.clone();
                let nonce = &mut trits[NONCE_TRIT_OFFSET..];
                for trit in nonce.iter_mut() {
                    *trit = 0;
                }
                let prefix = crate::trinary::int_to_trits(worker as i64, WORKER_PREFIX_TRITS);
                nonce[..WORKER_PREFIX_TRITS].copy_from_slice(&prefix);

                while !found.load(Ordering::Relaxed) {
                    let hash = curl_hash(&trits);
                    if trailing_zeros(&hash) >= mwm {
                        let nonce_trytes =
                            trytes_from_trits(&trits[NONCE_TRIT_OFFSET..]);
                        let mut slot = result.lock().unwrap();
                        if slot.is_none() {
                            *slot = Some(nonce_trytes);
                        }
                        found.store(true, Ordering::Relaxed);
                        return;
                    }
                    if !increment_trits(
                        &mut trits[NONCE_TRIT_OFFSET + WORKER_PREFIX_TRITS..],
                    ) {
                        return;
                    }
                }
            });
        }
    });

    match result.into_inner().unwrap() {
        Some(nonce) => Ok(nonce),
        None => bail!("nonce space exhausted without satisfying MWM {}", mwm),
    }
}
