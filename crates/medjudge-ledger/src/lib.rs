//! # medjudge-ledger
//!
//! Append-only interaction history for medjudge episodes.
//!
//! ## Overview
//!
//! The ledger records every tool call, tool result and finish message in the
//! exact textual shape the external grader reverse-parses (see [`render`]),
//! encodes embedded JSON the way that grader's encoder does (see [`json`]),
//! and links entries into a SHA-256 chain so sealed transcripts are tamper
//! evident (see [`chain`]).
//!
//! ```rust,ignore
//! use medjudge_ledger::HistoryLedger;
//!
//! let mut ledger = HistoryLedger::new(episode_id);
//! let brief = ledger.record_tool_call(&call, &result, "http://localhost:8080/fhir");
//! ledger.record_finish("FINISH([\"S1234567\"])");
//! assert!(ledger.verify_integrity());
//! ```

pub mod chain;
pub mod json;
pub mod ledger;
pub mod render;

pub use chain::{hash_entry, verify_chain, ChainLink, GENESIS_HASH};
pub use ledger::{HistoryLedger, Transcript};
pub use render::{RESULT_BRIEF_LIMIT, WRITE_ACKNOWLEDGMENT};

// ── Tests ─────────────────────────────────────────────────────────────────────
