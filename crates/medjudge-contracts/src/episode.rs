//! Episode identity and step results.
//!
//! `Transition` is what the episode manager returns from every `step`.
//! Rewards are sparse: only a `Finish` action can yield a non-zero reward.

use serde::{Deserialize, Serialize};

use crate::{evaluation::EvaluationRecord, observation::Observation};

/// Unique identifier for one episode. A new one is minted on every reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeId(pub uuid::Uuid);

impl EpisodeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for EpisodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a step ended the episode without a `Finish`, or was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepReason {
    /// The configured step limit was reached by a tool call.
    StepLimitReached,
    /// `step` was called after the episode had already terminated.
    EpisodeAlreadyDone,
}

/// Diagnostic details attached to a step result.
///
/// Absent fields are omitted when serialized, so a plain non-terminal tool
/// call serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<StepReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
}

impl StepInfo {
    pub fn with_reason(reason: StepReason) -> Self {
        Self {
            reason: Some(reason),
            ..Self::default()
        }
    }
}

/// The result of one `step` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
}
