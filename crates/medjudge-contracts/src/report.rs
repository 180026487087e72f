//! Assessment progress updates and the final report artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{episode::EpisodeId, evaluation::EvaluationRecord};

/// A progress message emitted once per assessment turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub step: u32,
    pub max_steps: u32,
    /// Short human-readable status, e.g. `Step 2: call_tool - get_conditions`.
    pub status: String,
    pub done: bool,
    pub timestamp: DateTime<Utc>,
}

/// The sealed result of one assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeReport {
    pub episode_id: EpisodeId,
    pub task_id: String,
    pub subject_id: String,
    /// Accepted actions, i.e. the episode's final step counter.
    pub total_steps: u32,
    pub evaluation: EvaluationRecord,
    pub final_summary: Option<String>,
    /// 1.0 when the grader accepted the answer, 0.0 otherwise.
    pub score: f64,
    /// Set when the assessment ended abnormally (participant failure,
    /// exhausted protocol retries).
    pub error: Option<String>,
    /// Terminal hash of the sealed transcript.
    pub transcript_hash: String,
    pub finished_at: DateTime<Utc>,
}
