//! Curl-P-81 sponge over balanced trits.
//!
//! The chain-native hash: a 729-trit state absorbed/squeezed in 243-trit
//! blocks with 81 transform rounds. Transaction hashes, bundle hashes,
//! address checksums and proof-of-work validation all go through this.

use crate::trinary::HASH_TRITS;

pub const STATE_LENGTH: usize = 729;
const NUMBER_OF_ROUNDS: usize = 81;

// Indexed by a + 4b + 5 for trit pair (a, b)
const TRUTH_TABLE: [i8; 11] = [1, 0, -1, 2, 1, -1, 0, 2, -1, 1, 0];

pub struct Curl {
    state: [i8; STATE_LENGTH],
}

impl Default for Curl {
    fn default() -> Self {
        Self::new()
    }
}

impl Curl {
    pub fn new() -> Self {
        Self {
            state: [0; STATE_LENGTH],
        }
    }

    pub fn reset(&mut self) {
        self.state = [0; STATE_LENGTH];
    }

    /// Absorb trits in 243-trit blocks; a short final block is permitted.
    pub fn absorb(&mut self, trits: &[i8]) {
        for chunk in trits.chunks(HASH_TRITS) {
            self.state[..chunk.len()].copy_from_slice(chunk);
            self.transform();
        }
    }

    /// Squeeze `len` trits out of the sponge.
    pub fn squeeze(&mut self, len: usize) -> Vec<i8> {
        let mut out = Vec::with_capacity(len);
        while out.len() < len {
            let take = (len - out.len()).min(HASH_TRITS);
            out.extend_from_slice(&self.state[..take]);
            self.transform();
        }
        out
    }

    fn transform(&mut self) {
        let mut scratch = [0i8; STATE_LENGTH];
        for _ in 0..NUMBER_OF_ROUNDS {
            scratch.copy_from_slice(&self.state);
            let mut index = 0usize;
            for slot in self.state.iter_mut() {
                let a = scratch[index];
                index = if index < 365 { index + 364 } else { index - 365 };
                let b = scratch[index];
                *slot = TRUTH_TABLE[(a + (b << 2) + 5) as usize];
            }
        }
    }
}

/// One-shot 243-trit Curl digest.
pub fn curl_hash(trits: &[i8]) -> Vec<i8> {
    let mut curl = Curl::new();
    curl.absorb(trits);
    curl.squeeze(HASH_TRITS)
}
