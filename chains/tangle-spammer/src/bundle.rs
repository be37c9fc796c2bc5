//! Transfer and bundle construction.
//!
//! A [`Transfer`] is the caller-facing descriptor (destination, tag,
//! always-zero value). [`prepare_bundle`] turns transfers into finalized
//! transaction trytes: fixed-width fields, a Curl bundle hash over the
//! per-transaction essence, and empty signature fragments (zero-value
//! transfers move no funds and need no signing).

use crate::curl::{Curl, curl_hash};
use crate::trinary::{
    ADDRESS_OFFSET, ADDRESS_TRYTES, ATTACHMENT_TS_LOWER_OFFSET, ATTACHMENT_TS_OFFSET,
    ATTACHMENT_TS_UPPER_OFFSET, BRANCH_OFFSET, BUNDLE_OFFSET, CHECKSUM_TRYTES,
    CURRENT_INDEX_OFFSET, HASH_TRITS, HASH_TRYTES, LAST_INDEX_OFFSET, NONCE_OFFSET, NONCE_TRYTES,
    OBSOLETE_TAG_OFFSET, SEED_TRYTES, SIG_MSG_OFFSET, SIG_MSG_TRYTES, TAG_OFFSET, TAG_TRYTES,
    TIMESTAMP_OFFSET, TIMESTAMP_TRYTES, TRUNK_OFFSET, TRYTES_PER_TRANSACTION, VALUE_OFFSET,
    VALUE_TRYTES, int_to_trits, is_trytes, pad_trytes, trits_from_trytes, trits_to_int,
    trytes_from_trits,
};
use anyhow::{Context, Result, bail, ensure};

/// A transfer descriptor: destination, tag, and a value that is always
/// zero in this system. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub address: String,
    pub value: i64,
    pub tag: String,
}

impl Transfer {
    /// Build a zero-value transfer to `address` with `tag`.
    ///
    /// Fails only on address/tag format violations; callers validate their
    /// configuration at startup so this cannot fail mid-loop.
    pub fn zero_value(address: &str, tag: &str) -> Result<Transfer> {
        ensure!(
            is_trytes(address)
                && (address.len() == ADDRESS_TRYTES
                    || address.len() == ADDRESS_TRYTES + CHECKSUM_TRYTES),
            "address must be {} trytes (or {} with checksum), got '{}'",
            ADDRESS_TRYTES,
            ADDRESS_TRYTES + CHECKSUM_TRYTES,
            address
        );
        ensure!(
            is_trytes(tag) && tag.len() <= TAG_TRYTES,
            "tag must be at most {} trytes, got '{}'",
            TAG_TRYTES,
            tag
        );
        Ok(Transfer {
            address: address.to_string(),
            value: 0,
            tag: pad_trytes(tag, TAG_TRYTES),
        })
    }
}

/// One transaction of a bundle, mirroring the 2673-tryte wire layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signature_message_fragment: String,
    pub address: String,
    pub value: i64,
    pub obsolete_tag: String,
    pub timestamp: i64,
    pub current_index: i64,
    pub last_index: i64,
    pub bundle: String,
    pub trunk: String,
    pub branch: String,
    pub tag: String,
    pub attachment_timestamp: i64,
    pub attachment_timestamp_lower: i64,
    pub attachment_timestamp_upper: i64,
    pub nonce: String,
    /// Curl hash of the attached transaction; empty until attachment.
    pub hash: String,
}

fn int_field(value: i64, trytes: usize) -> String {
    trytes_from_trits(&int_to_trits(value, trytes * 3))
}

impl Transaction {
    /// Serialize to the fixed 2673-tryte wire form.
    pub fn to_trytes(&self) -> Result<String> {
        ensure!(
            self.signature_message_fragment.len() == SIG_MSG_TRYTES,
            "signature fragment must be {} trytes",
            SIG_MSG_TRYTES
        );
        ensure!(
            self.address.len() == ADDRESS_TRYTES,
            "transaction address must be {} trytes",
            ADDRESS_TRYTES
        );

        let mut out = String::with_capacity(TRYTES_PER_TRANSACTION);
        out.push_str(&self.signature_message_fragment);
        out.push_str(&self.address);
        out.push_str(&int_field(self.value, VALUE_TRYTES));
        out.push_str(&pad_trytes(&self.obsolete_tag, TAG_TRYTES));
        out.push_str(&int_field(self.timestamp, TIMESTAMP_TRYTES));
        out.push_str(&int_field(self.current_index, TIMESTAMP_TRYTES));
        out.push_str(&int_field(self.last_index, TIMESTAMP_TRYTES));
        out.push_str(&pad_trytes(&self.bundle, HASH_TRYTES));
        out.push_str(&pad_trytes(&self.trunk, HASH_TRYTES));
        out.push_str(&pad_trytes(&self.branch, HASH_TRYTES));
        out.push_str(&pad_trytes(&self.tag, TAG_TRYTES));
        out.push_str(&int_field(self.attachment_timestamp, TIMESTAMP_TRYTES));
        out.push_str(&int_field(self.attachment_timestamp_lower, TIMESTAMP_TRYTES));
        out.push_str(&int_field(self.attachment_timestamp_upper, TIMESTAMP_TRYTES));
        out.push_str(&pad_trytes(&self.nonce, NONCE_TRYTES));

        ensure!(
            out.len() == TRYTES_PER_TRANSACTION,
            "serialized transaction is {} trytes, expected {}",
            out.len(),
            TRYTES_PER_TRANSACTION
        );
        Ok(out)
    }

    /// Parse the fixed wire form back into a transaction. The hash field
    /// is left empty; it only exists after attachment.
    pub fn from_trytes(trytes: &str) -> Result<Transaction> {
        ensure!(
            trytes.len() == TRYTES_PER_TRANSACTION && is_trytes(trytes),
            "expected {} transaction trytes",
            TRYTES_PER_TRANSACTION
        );

        let field = |offset: usize, len: usize| trytes[offset..offset + len].to_string();
        let int_of = |offset: usize, len: usize| -> Result<i64> {
            let trits = trits_from_trytes(&trytes[offset..offset + len])?;
            Ok(trits_to_int(&trits))
        };

        Ok(Transaction {
            signature_message_fragment: field(SIG_MSG_OFFSET, SIG_MSG_TRYTES),
            address: field(ADDRESS_OFFSET, ADDRESS_TRYTES),
            value: int_of(VALUE_OFFSET, VALUE_TRYTES)?,
            obsolete_tag: field(OBSOLETE_TAG_OFFSET, TAG_TRYTES),
            timestamp: int_of(TIMESTAMP_OFFSET, TIMESTAMP_TRYTES)?,
            current_index: int_of(CURRENT_INDEX_OFFSET, TIMESTAMP_TRYTES)?,
            last_index: int_of(LAST_INDEX_OFFSET, TIMESTAMP_TRYTES)?,
            bundle: field(BUNDLE_OFFSET, HASH_TRYTES),
            trunk: field(TRUNK_OFFSET, HASH_TRYTES),
            branch: field(BRANCH_OFFSET, HASH_TRYTES),
            tag: field(TAG_OFFSET, TAG_TRYTES),
            attachment_timestamp: int_of(ATTACHMENT_TS_OFFSET, TIMESTAMP_TRYTES)?,
            attachment_timestamp_lower: int_of(ATTACHMENT_TS_LOWER_OFFSET, TIMESTAMP_TRYTES)?,
            attachment_timestamp_upper: int_of(ATTACHMENT_TS_UPPER_OFFSET, TIMESTAMP_TRYTES)?,
            nonce: field(NONCE_OFFSET, NONCE_TRYTES),
            hash: String::new(),
        })
    }

    /// The 486-trit bundle essence of this transaction.
    fn essence_trits(&self) -> Result<Vec<i8>> {
        let mut trits = trits_from_trytes(&self.address).context("invalid address trytes")?;
        trits.extend(int_to_trits(self.value, VALUE_TRYTES * 3));
        trits.extend(trits_from_trytes(&self.obsolete_tag)?);
        trits.extend(int_to_trits(self.timestamp, TIMESTAMP_TRYTES * 3));
        trits.extend(int_to_trits(self.current_index, TIMESTAMP_TRYTES * 3));
        trits.extend(int_to_trits(self.last_index, TIMESTAMP_TRYTES * 3));
        Ok(trits)
    }
}

/// Curl hash of a serialized transaction, as 81 trytes.
pub fn transaction_hash(trytes: &str) -> Result<String> {
    let trits = trits_from_trytes(trytes)?;
    ensure!(
        trits.len() == TRYTES_PER_TRANSACTION * 3,
        "expected {} transaction trytes",
        TRYTES_PER_TRANSACTION
    );
    Ok(trytes_from_trits(&curl_hash(&trits)))
}

/// 9-tryte checksum for an 81-tryte address: the tail of a Curl squeeze
/// over the address trits.
pub fn address_checksum(address: &str) -> Result<String> {
    ensure!(
        is_trytes(address) && address.len() == ADDRESS_TRYTES,
        "checksum input must be {} address trytes",
        ADDRESS_TRYTES
    );
    let mut curl = Curl::new();
    curl.absorb(&trits_from_trytes(address)?);
    let digest = trytes_from_trits(&curl.squeeze(HASH_TRITS));
    Ok(digest[HASH_TRYTES - CHECKSUM_TRYTES..].to_string())
}

/// Verify and remove a trailing checksum, if present.
///
/// A bare 81-tryte address passes through untouched; a 90-tryte address
/// must carry a matching checksum.
pub fn strip_checksum(address: &str) -> Result<String> {
    match address.len() {
        ADDRESS_TRYTES => Ok(address.to_string()),
        len if len == ADDRESS_TRYTES + CHECKSUM_TRYTES => {
            let (base, checksum) = address.split_at(ADDRESS_TRYTES);
            let expected = address_checksum(base)?;
            ensure!(
                checksum == expected,
                "checksum mismatch for address '{}'",
                address
            );
            Ok(base.to_string())
        }
        len => bail!("address must be 81 or 90 trytes, got {}", len),
    }
}

/// Build the finalized bundle trytes for `transfers`, head (index 0) first.
///
/// Zero-value bundles carry empty signature fragments; the seed is
/// validated but only consumed when signing inputs, which this system
/// never has.
pub fn prepare_bundle(seed: &str, transfers: &[Transfer], timestamp: i64) -> Result<Vec<String>> {
    ensure!(
        is_trytes(seed) && seed.len() == SEED_TRYTES,
        "seed must be {} trytes",
        SEED_TRYTES
    );
    ensure!(!transfers.is_empty(), "bundle needs at least one transfer");

    let last_index = transfers.len() as i64 - 1;
    let mut transactions = Vec::with_capacity(transfers.len());
    for (index, transfer) in transfers.iter().enumerate() {
        ensure!(
            transfer.value == 0,
            "only zero-value transfers are supported, got {}",
            transfer.value
        );
        let address = strip_checksum(&transfer.address)?;
        let tag = pad_trytes(&transfer.tag, TAG_TRYTES);
        transactions.push(Transaction {
            signature_message_fragment: "9".repeat(SIG_MSG_TRYTES),
            address,
            value: transfer.value,
            obsolete_tag: tag.clone(),
            timestamp,
            current_index: index as i64,
            last_index,
            bundle: "9".repeat(HASH_TRYTES),
            trunk: "9".repeat(HASH_TRYTES),
            branch: "9".repeat(HASH_TRYTES),
            tag,
            attachment_timestamp: 0,
            attachment_timestamp_lower: 0,
            attachment_timestamp_upper: 0,
            nonce: "9".repeat(NONCE_TRYTES),
            hash: String::new(),
        });
    }

    // Finalize: Curl over the concatenated essences yields the bundle hash
    let mut curl = Curl::new();
    for tx in &transactions {
        curl.absorb(&tx.essence_trits()?);
    }
    let bundle_hash = trytes_from_trits(&curl.squeeze(HASH_TRITS));
    for tx in &mut transactions {
        tx.bundle = bundle_hash.clone();
    }

    transactions.iter().map(|tx| tx.to_trytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_address() -> String {
        "B".repeat(ADDRESS_TRYTES)
    }

    #[test]
    fn test_zero_value_transfer_always_zero() {
        let transfer = Transfer::zero_value(&sample_address(), "SPAM").unwrap();
        assert_eq!(transfer.value, 0);
        assert_eq!(transfer.tag.len(), TAG_TRYTES);
        assert!(transfer.tag.starts_with("SPAM"));
    }

    #[test]
    fn test_transfer_rejects_bad_address() {
        assert!(Transfer::zero_value("TOO9SHORT", "TAG").is_err());
        assert!(Transfer::zero_value(&"b".repeat(81), "TAG").is_err());
        assert!(Transfer::zero_value(&"C".repeat(82), "TAG").is_err());
    }

    #[test]
    fn test_transfer_rejects_bad_tag() {
        assert!(Transfer::zero_value(&sample_address(), &"T".repeat(28)).is_err());
        assert!(Transfer::zero_value(&sample_address(), "lower").is_err());
    }

    #[test]
    fn test_transaction_trytes_round_trip() {
        let transfer = Transfer::zero_value(&sample_address(), "ROUNDTRIP").unwrap();
        let trytes = prepare_bundle(&"9".repeat(SEED_TRYTES), &[transfer], 1_700_000_000).unwrap();
        assert_eq!(trytes.len(), 1);
        assert_eq!(trytes[0].len(), TRYTES_PER_TRANSACTION);

        let tx = Transaction::from_trytes(&trytes[0]).unwrap();
        assert_eq!(tx.value, 0);
        assert_eq!(tx.address, sample_address());
        assert_eq!(tx.timestamp, 1_700_000_000);
        assert_eq!(tx.current_index, 0);
        assert_eq!(tx.last_index, 0);
        assert_eq!(tx.to_trytes().unwrap(), trytes[0]);
    }

    #[test]
    fn test_from_trytes_reads_reference_fields() {
        let transfer = Transfer::zero_value(&sample_address(), "REFS").unwrap();
        let trytes = prepare_bundle(&"9".repeat(SEED_TRYTES), &[transfer], 7).unwrap();

        let mut tx = Transaction::from_trytes(&trytes[0]).unwrap();
        tx.trunk = "T".repeat(HASH_TRYTES);
        tx.branch = "U".repeat(HASH_TRYTES);
        tx.nonce = "N".repeat(NONCE_TRYTES);

        let parsed = Transaction::from_trytes(&tx.to_trytes().unwrap()).unwrap();
        assert_eq!(parsed.signature_message_fragment, "9".repeat(SIG_MSG_TRYTES));
        assert_eq!(parsed.trunk, tx.trunk);
        assert_eq!(parsed.branch, tx.branch);
        assert_eq!(parsed.nonce, tx.nonce);
    }

    #[test]
    fn test_bundle_hash_shared_and_deterministic() {
        let seed = "9".repeat(SEED_TRYTES);
        let transfers = vec![
            Transfer::zero_value(&sample_address(), "ONE").unwrap(),
            Transfer::zero_value(&"D".repeat(ADDRESS_TRYTES), "TWO").unwrap(),
        ];
        let trytes = prepare_bundle(&seed, &transfers, 42).unwrap();
        let first = Transaction::from_trytes(&trytes[0]).unwrap();
        let second = Transaction::from_trytes(&trytes[1]).unwrap();
        assert_eq!(first.bundle, second.bundle);
        assert_ne!(first.bundle, "9".repeat(HASH_TRYTES));
        assert_eq!(first.last_index, 1);
        assert_eq!(second.current_index, 1);

        let again = prepare_bundle(&seed, &transfers, 42).unwrap();
        assert_eq!(trytes, again);
    }

    #[test]
    fn test_checksum_round_trip() {
        let address = sample_address();
        let checksum = address_checksum(&address).unwrap();
        assert_eq!(checksum.len(), CHECKSUM_TRYTES);

        let full = format!("{}{}", address, checksum);
        assert_eq!(strip_checksum(&full).unwrap(), address);
        assert_eq!(strip_checksum(&address).unwrap(), address);
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let address = sample_address();
        let mut checksum = address_checksum(&address).unwrap();
        // Corrupt one tryte
        let replacement = if checksum.starts_with('A') { "B" } else { "A" };
        checksum.replace_range(0..1, replacement);
        let full = format!("{}{}", address, checksum);
        assert!(strip_checksum(&full).is_err());
    }

    #[test]
    fn test_prepare_bundle_accepts_checksummed_address() {
        let address = sample_address();
        let full = format!("{}{}", address, address_checksum(&address).unwrap());
        let transfer = Transfer::zero_value(&full, "CHECKED").unwrap();
        let trytes = prepare_bundle(&"9".repeat(SEED_TRYTES), &[transfer], 7).unwrap();
        let tx = Transaction::from_trytes(&trytes[0]).unwrap();
        assert_eq!(tx.address, address);
    }

    #[test]
    fn test_prepare_bundle_rejects_bad_seed() {
        let transfer = Transfer::zero_value(&sample_address(), "TAG").unwrap();
        assert!(prepare_bundle("SHORT", &[transfer], 7).is_err());
    }

    #[test]
    fn test_transaction_hash_is_81_trytes() {
        let transfer = Transfer::zero_value(&sample_address(), "HASHME").unwrap();
        let trytes = prepare_bundle(&"9".repeat(SEED_TRYTES), &[transfer], 7).unwrap();
        let hash = transaction_hash(&trytes[0]).unwrap();
        assert_eq!(hash.len(), HASH_TRYTES);
        assert!(is_trytes(&hash));
    }
}
