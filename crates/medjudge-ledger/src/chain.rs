//! Hash-chain primitives for the history ledger.
//!
//! Hash input layout (bytes, in order):
//!   1. episode_id as UTF-8 bytes
//!   2. sequence as 8-byte little-endian
//!   3. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   4. role as UTF-8 bytes
//!   5. content length as 8-byte little-endian
//!   6. content as UTF-8 bytes

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use medjudge_contracts::history::HistoryEntry;

/// `prev_hash` of the first entry in every chain.
pub const GENESIS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Chain metadata for one ledger entry. `sequence` equals the entry's index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    pub sequence: u64,
    pub prev_hash: String,
    pub this_hash: String,
}

/// Compute the SHA-256 hash of one history entry at a given chain position.
///
/// Returns a lowercase 64-character hex string.
pub fn hash_entry(episode_id: &str, sequence: u64, entry: &HistoryEntry, prev_hash: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(episode_id.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(entry.role.as_str().as_bytes());
    hasher.update((entry.content.len() as u64).to_le_bytes());
    hasher.update(entry.content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a chain of entries against their links.
///
/// Valid when every link's `sequence` matches its position, every
/// `prev_hash` equals the previous `this_hash` (or `GENESIS_HASH`), and
/// every `this_hash` matches the recomputed value. An empty chain is valid.
pub fn verify_chain(episode_id: &str, entries: &[HistoryEntry], links: &[ChainLink]) -> bool {
    if entries.len() != links.len() {
        return false;
    }

    let mut expected_prev = GENESIS_HASH.to_string();
    for (idx, (entry, link)) in entries.iter().zip(links).enumerate() {
        if link.sequence != idx as u64 || link.prev_hash != expected_prev {
            return false;
        }
        if link.this_hash != hash_entry(episode_id, link.sequence, entry, &link.prev_hash) {
            return false;
        }
        expected_prev = link.this_hash.clone();
    }

    true
}
