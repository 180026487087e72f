//! # medjudge-ref-fhir
//!
//! Reference boundary implementations for running medjudge episodes locally.
//!
//! Components:
//!   1. `FhirStore`: in-memory clinical records seeded from `mock_data`
//!   2. `MockFhirExecutor`: the nine record-service tools over the store
//!   3. `TaskPool`: a task corpus with seeded or entropy-based sampling
//!   4. `ScriptedParticipant`: replays fixed replies, with reference
//!      solutions for the bundled sample corpus
//!
//! `reference_manager` wires all of them, plus the built-in grading rules,
//! into an `EpisodeManager`.
//!
//! All clinical data is fictional. No network connections are made.

pub mod mock_data;
pub mod participants;
pub mod store;
pub mod tasks;
pub mod tools;

use medjudge_contracts::error::JudgeResult;
use medjudge_core::{config::EpisodeConfig, episode::EpisodeManager};
use medjudge_grading::GraderRegistry;

pub use participants::{reference_replies, ScriptedParticipant};
pub use store::FhirStore;
pub use tasks::{TaskPool, SAMPLE_TASKS};
pub use tools::{MockFhirExecutor, DEFAULT_BASE_URL};

/// An episode manager over `pool`, a fresh seeded store at `base_url`, and
/// the built-in grading rules.
pub fn reference_manager(pool: TaskPool, base_url: &str, config: EpisodeConfig) -> JudgeResult<EpisodeManager> {
    Ok(EpisodeManager::new(
        Box::new(pool),
        Box::new(MockFhirExecutor::new(base_url)),
        Box::new(GraderRegistry::builtin()?),
        config,
    ))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
