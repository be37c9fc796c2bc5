//! Trytes/trits codec for the tangle's ternary wire format.
//!
//! Everything the node speaks is trytes: 27 characters (`9A..Z`), each
//! encoding three balanced trits. Transactions are fixed-width tryte
//! strings; the offsets of every field are defined here.

use anyhow::{Result, bail};
use rand::Rng;

pub const TRYTE_ALPHABET: &[u8] = b"9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

pub const HASH_TRYTES: usize = 81;
pub const HASH_TRITS: usize = 243;
pub const ADDRESS_TRYTES: usize = 81;
pub const CHECKSUM_TRYTES: usize = 9;
pub const TAG_TRYTES: usize = 27;
pub const SEED_TRYTES: usize = 81;

pub const TRYTES_PER_TRANSACTION: usize = 2673;
pub const TRITS_PER_TRANSACTION: usize = 8019;

// Tryte offsets of the transaction fields, in wire order.
pub const SIG_MSG_OFFSET: usize = 0;
pub const SIG_MSG_TRYTES: usize = 2187;
pub const ADDRESS_OFFSET: usize = 2187;
pub const VALUE_OFFSET: usize = 2268;
pub const VALUE_TRYTES: usize = 27;
pub const OBSOLETE_TAG_OFFSET: usize = 2295;
pub const TIMESTAMP_OFFSET: usize = 2322;
pub const TIMESTAMP_TRYTES: usize = 9;
pub const CURRENT_INDEX_OFFSET: usize = 2331;
pub const LAST_INDEX_OFFSET: usize = 2340;
pub const BUNDLE_OFFSET: usize = 2349;
pub const TRUNK_OFFSET: usize = 2430;
pub const BRANCH_OFFSET: usize = 2511;
pub const TAG_OFFSET: usize = 2592;
pub const ATTACHMENT_TS_OFFSET: usize = 2619;
pub const ATTACHMENT_TS_LOWER_OFFSET: usize = 2628;
pub const ATTACHMENT_TS_UPPER_OFFSET: usize = 2637;
pub const NONCE_OFFSET: usize = 2646;
pub const NONCE_TRYTES: usize = 27;
pub const NONCE_TRIT_OFFSET: usize = NONCE_OFFSET * 3;

/// True when every character of `s` is a valid tryte (`9` or `A`-`Z`).
pub fn is_trytes(s: &str) -> bool {
    s.bytes().all(|b| b == b'9' || b.is_ascii_uppercase())
}

/// Random tryte string over the full alphabet.
pub fn random_trytes<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| TRYTE_ALPHABET[rng.gen_range(0..TRYTE_ALPHABET.len())] as char)
        .collect()
}

/// Random string of letters only (no `9`), for tag suffixes.
pub fn random_letters<R: Rng>(rng: &mut R, len: usize) -> String {
    (0..len).map(|_| rng.gen_range(b'A'..=b'Z') as char).collect()
}

/// Right-pad with `9` up to `len`.
pub fn pad_trytes(s: &str, len: usize) -> String {
    let mut out = String::with_capacity(len);
    out.push_str(s);
    while out.len() < len {
        out.push('9');
    }
    out
}

fn tryte_value(b: u8) -> Result<i8> {
    let index = match b {
        b'9' => 0i8,
        b'A'..=b'Z' => (b - b'A') as i8 + 1,
        _ => bail!("invalid tryte character '{}'", b as char),
    };
    // Balanced: N..Z represent -13..-1
    Ok(if index > 13 { index - 27 } else { index })
}

fn value_to_trits3(mut v: i8) -> [i8; 3] {
    let mut trits = [0i8; 3];
    for trit in trits.iter_mut() {
        let mut r = v % 3;
        v /= 3;
        if r == 2 {
            r = -1;
            v += 1;
        } else if r == -2 {
            r = 1;
            v -= 1;
        }
        *trit = r;
    }
    trits
}

/// Decode a tryte string into balanced trits (3 per tryte, LSB first).
pub fn trits_from_trytes(trytes: &str) -> Result<Vec<i8>> {
    let mut trits = Vec::with_capacity(trytes.len() * 3);
    for b in trytes.bytes() {
        trits.extend_from_slice(&value_to_trits3(tryte_value(b)?));
    }
    Ok(trits)
}

/// Encode balanced trits back into trytes. Length must be a multiple of 3.
pub fn trytes_from_trits(trits: &[i8]) -> String {
    debug_assert_eq!(trits.len() % 3, 0);
    trits
        .chunks(3)
        .map(|chunk| {
            let mut v = chunk[0] as i32 + 3 * chunk[1] as i32 + 9 * chunk[2] as i32;
            if v < 0 {
                v += 27;
            }
            TRYTE_ALPHABET[v as usize] as char
        })
        .collect()
}

/// Encode an integer as `len` balanced trits, LSB first.
pub fn int_to_trits(value: i64, len: usize) -> Vec<i8> {
    let mut trits = vec![0i8; len];
    let mut v = value;
    for trit in trits.iter_mut() {
        if v == 0 {
            break;
        }
        let mut r = (v % 3) as i8;
        v /= 3;
        if r == 2 {
            r = -1;
            v += 1;
        } else if r == -2 {
            r = 1;
            v -= 1;
        }
        *trit = r;
    }
    debug_assert_eq!(v, 0, "{} does not fit in {} trits", value, len);
    trits
}

/// Decode balanced trits (LSB first) into an integer.
pub fn trits_to_int(trits: &[i8]) -> i64 {
    trits
        .iter()
        .rev()
        .fold(0i64, |acc, &t| acc * 3 + t as i64)
}

/// Number of consecutive zero trits at the end of a hash. This is what the
/// minimum weight magnitude constrains.
pub fn trailing_zeros(trits: &[i8]) -> usize {
    trits.iter().rev().take_while(|&&t| t == 0).count()
}
