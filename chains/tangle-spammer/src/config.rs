//! CLI surface and engine configuration.
//!
//! All validation and randomness happen here, once, at startup: the
//! steady-state loop only ever consumes the resulting [`EngineConfig`].

use crate::bundle::{address_checksum, strip_checksum};
use crate::trinary::{
    ADDRESS_TRYTES, HASH_TRITS, SEED_TRYTES, TAG_TRYTES, is_trytes, pad_trytes, random_letters,
    random_trytes,
};
use anyhow::Result;
use clap::Parser;
use core_logic::ConfigError;
use rand::Rng;
use url::Url;

/// Tangle explorer used in the startup and per-submission log lines.
pub const EXPLORER_URL: &str = "https://thetangle.org";

/// Placeholder expanded with the PoW name and a random 3-letter suffix
/// when the user does not pass their own tag.
pub const DEFAULT_TAG_TEMPLATE: &str = "999GOPOW9<pow>9<random>";

#[derive(Parser, Debug)]
#[command(author, version, about = "Zero-value transaction spammer for the tangle", long_about = None)]
pub struct Args {
    /// Minimum weight magnitude for proof-of-work
    #[arg(long, default_value_t = 14)]
    pub mwm: u64,

    /// Depth for tip selection
    #[arg(long, default_value_t = 1)]
    pub depth: u64,

    /// Address to send to (random when omitted)
    #[arg(long)]
    pub address: Option<String>,

    /// Transaction tag
    #[arg(long, default_value = DEFAULT_TAG_TEMPLATE)]
    pub tag: String,

    /// Remote node to connect to
    #[arg(long, default_value = "http://localhost:14265")]
    pub node: String,
}

/// Immutable process-lifetime configuration consumed by every loop
/// iteration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub node: Url,
    pub mwm: u64,
    pub depth: u64,
    /// Destination address, checksum appended (90 trytes).
    pub address: String,
    /// Transaction tag, padded to 27 trytes.
    pub tag: String,
    /// Ephemeral seed for this run; never persisted.
    pub seed: String,
}

impl EngineConfig {
    /// Build the configuration from CLI args plus the startup random
    /// source. The RNG is only used here, never by the loop itself.
    pub fn from_args<R: Rng>(args: Args, pow_name: &str, rng: &mut R) -> Result<Self> {
        let node = Url::parse(&args.node).map_err(|_| ConfigError::InvalidNodeUrl {
            url: args.node.clone(),
        })?;

        if args.mwm as usize > HASH_TRITS {
            return Err(ConfigError::InvalidValue {
                field: "mwm".to_string(),
                reason: format!("must be at most {}", HASH_TRITS),
            }
            .into());
        }

        let base_address = match &args.address {
            Some(address) => {
                if !is_trytes(address) {
                    return Err(ConfigError::InvalidTrytes {
                        field: "address".to_string(),
                        expected: "characters 9, A-Z".to_string(),
                        got: address.clone(),
                    }
                    .into());
                }
                // Verifies an attached checksum, rejects bad lengths
                strip_checksum(address).map_err(|e| ConfigError::InvalidValue {
                    field: "address".to_string(),
                    reason: format!("{:#}", e),
                })?
            }
            None => random_trytes(rng, ADDRESS_TRYTES),
        };
        let address = format!("{}{}", base_address, address_checksum(&base_address)?);

        let tag = if args.tag == DEFAULT_TAG_TEMPLATE {
            format!(
                "999GOPOW9{}9{}",
                pow_name.to_uppercase(),
                random_letters(rng, 3)
            )
        } else {
            args.tag.clone()
        };
        if !is_trytes(&tag) || tag.len() > TAG_TRYTES {
            return Err(ConfigError::InvalidTrytes {
                field: "tag".to_string(),
                expected: format!("at most {} trytes", TAG_TRYTES),
                got: tag,
            }
            .into());
        }

        Ok(EngineConfig {
            node,
            mwm: args.mwm,
            depth: args.depth,
            address,
            tag: pad_trytes(&tag, TAG_TRYTES),
            seed: random_trytes(rng, SEED_TRYTES),
        })
    }

    /// Address without its checksum, for explorer links.
    pub fn bare_address(&self) -> &str {
        &self.address[..ADDRESS_TRYTES]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn parse(args: &[&str]) -> Args {
        Args::parse_from(std::iter::once("tangle-spammer").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = EngineConfig::from_args(parse(&[]), "THREADED", &mut rng).unwrap();

        assert_eq!(config.mwm, 14);
        assert_eq!(config.depth, 1);
        assert_eq!(config.node.as_str(), "http://localhost:14265/");
        assert_eq!(config.address.len(), 90);
        assert_eq!(config.seed.len(), 81);
        assert!(is_trytes(&config.address));
        assert!(is_trytes(&config.seed));
    }

    #[test]
    fn test_default_tag_expands_pow_name() {
        let mut rng = StdRng::seed_from_u64(2);
        let config = EngineConfig::from_args(parse(&[]), "THREADED", &mut rng).unwrap();

        assert!(config.tag.starts_with("999GOPOW9THREADED9"));
        assert_eq!(config.tag.len(), TAG_TRYTES);
    }

    #[test]
    fn test_custom_tag_is_kept_and_padded() {
        let mut rng = StdRng::seed_from_u64(3);
        let args = parse(&["--tag", "MYSPAM"]);
        let config = EngineConfig::from_args(args, "SEQUENTIAL", &mut rng).unwrap();

        assert_eq!(config.tag, pad_trytes("MYSPAM", TAG_TRYTES));
    }

    #[test]
    fn test_custom_address_gets_checksum() {
        let mut rng = StdRng::seed_from_u64(4);
        let base = "Z".repeat(ADDRESS_TRYTES);
        let args = parse(&["--address", &base]);
        let config = EngineConfig::from_args(args, "SEQUENTIAL", &mut rng).unwrap();

        assert_eq!(config.bare_address(), base);
        assert_eq!(config.address.len(), 90);
        assert_eq!(
            &config.address[ADDRESS_TRYTES..],
            address_checksum(&base).unwrap()
        );
    }

    #[test]
    fn test_invalid_address_rejected() {
        let mut rng = StdRng::seed_from_u64(5);
        let args = parse(&["--address", "not-trytes"]);
        assert!(EngineConfig::from_args(args, "SEQUENTIAL", &mut rng).is_err());

        let args = parse(&["--address", &"A".repeat(40)]);
        assert!(EngineConfig::from_args(args, "SEQUENTIAL", &mut rng).is_err());
    }

    #[test]
    fn test_invalid_node_url_rejected() {
        let mut rng = StdRng::seed_from_u64(6);
        let args = parse(&["--node", "not a url"]);
        assert!(EngineConfig::from_args(args, "SEQUENTIAL", &mut rng).is_err());
    }

    #[test]
    fn test_oversized_mwm_rejected() {
        let mut rng = StdRng::seed_from_u64(7);
        let args = parse(&["--mwm", "500"]);
        assert!(EngineConfig::from_args(args, "SEQUENTIAL", &mut rng).is_err());
    }

    #[test]
    fn test_oversized_tag_rejected() {
        let mut rng = StdRng::seed_from_u64(8);
        let args = parse(&["--tag", &"T".repeat(28)]);
        assert!(EngineConfig::from_args(args, "SEQUENTIAL", &mut rng).is_err());
    }
}
