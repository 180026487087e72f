//! The per-episode history ledger.
//!
//! `HistoryLedger` is the definitive record of an episode, consumed by the
//! grader. Entries are only ever appended; nothing is truncated, reordered or
//! rewritten once recorded. Each append also extends a SHA-256 chain so a
//! sealed `Transcript` can be checked for tampering later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use medjudge_contracts::{action::ToolCall, episode::EpisodeId, history::HistoryEntry};

use crate::{
    chain::{hash_entry, verify_chain, ChainLink, GENESIS_HASH},
    render::{render_finish, render_tool_call, render_tool_result, truncate_brief},
};

/// Append-only interaction history for one episode.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    episode_id: EpisodeId,
    pub(crate) entries: Vec<HistoryEntry>,
    pub(crate) links: Vec<ChainLink>,
}

impl HistoryLedger {
    pub fn new(episode_id: EpisodeId) -> Self {
        Self {
            episode_id,
            entries: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn episode_id(&self) -> EpisodeId {
        self.episode_id
    }

    /// Append one entry and extend the hash chain.
    pub fn append(&mut self, entry: HistoryEntry) {
        let sequence = self.entries.len() as u64;
        let prev_hash = self
            .links
            .last()
            .map(|l| l.this_hash.clone())
            .unwrap_or_else(|| GENESIS_HASH.to_string());
        let this_hash = hash_entry(&self.episode_id.to_string(), sequence, &entry, &prev_hash);

        debug!(
            episode_id = %self.episode_id,
            sequence,
            role = entry.role.as_str(),
            "history entry appended"
        );

        self.entries.push(entry);
        self.links.push(ChainLink {
            sequence,
            prev_hash,
            this_hash,
        });
    }

    /// Record a tool call and its result as an (agent, environment) pair.
    ///
    /// Returns the result brief to surface on the observation: the actual
    /// result truncated to the brief limit, even for write calls whose
    /// history entry is the fixed acknowledgment.
    pub fn record_tool_call(&mut self, call: &ToolCall, result: &str, base_url: &str) -> String {
        self.append(HistoryEntry::agent(render_tool_call(call, base_url)));
        self.append(HistoryEntry::environment(render_tool_result(call, result)));
        truncate_brief(result)
    }

    /// Record the agent's finish message.
    pub fn record_finish(&mut self, summary: &str) {
        self.append(HistoryEntry::agent(render_finish(summary)));
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hash of the last entry, or `GENESIS_HASH` when nothing is recorded.
    pub fn terminal_hash(&self) -> &str {
        self.links
            .last()
            .map(|l| l.this_hash.as_str())
            .unwrap_or(GENESIS_HASH)
    }

    /// Check that the in-memory chain has not been altered.
    pub fn verify_integrity(&self) -> bool {
        verify_chain(&self.episode_id.to_string(), &self.entries, &self.links)
    }

    /// Produce a sealed copy of the ledger.
    pub fn seal(&self) -> Transcript {
        let transcript = Transcript {
            episode_id: self.episode_id,
            entries: self.entries.clone(),
            links: self.links.clone(),
            sealed_at: Utc::now(),
            terminal_hash: self.terminal_hash().to_string(),
        };

        info!(
            episode_id = %self.episode_id,
            entry_count = transcript.entries.len(),
            terminal_hash = %transcript.terminal_hash,
            "history transcript sealed"
        );

        transcript
    }
}

/// A sealed, exportable copy of an episode's history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub episode_id: EpisodeId,
    pub entries: Vec<HistoryEntry>,
    pub links: Vec<ChainLink>,
    pub sealed_at: DateTime<Utc>,
    /// `this_hash` of the last entry, or `GENESIS_HASH` for an empty transcript.
    pub terminal_hash: String,
}

impl Transcript {
    /// Verify the chain and that `terminal_hash` commits to its last link.
    pub fn verify(&self) -> bool {
        let terminal = self
            .links
            .last()
            .map(|l| l.this_hash.as_str())
            .unwrap_or(GENESIS_HASH);
        terminal == self.terminal_hash
            && verify_chain(&self.episode_id.to_string(), &self.entries, &self.links)
    }
}
