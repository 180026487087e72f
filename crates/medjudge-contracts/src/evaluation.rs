//! The grading contract and evaluation records.
//!
//! `GradeRequest` is the single data contract between the runtime and any
//! grader. Graders receive exactly this, nothing reconstructed ad hoc.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::history::HistoryEntry;

/// Version of the `GradeRequest` layout. Bump when a field changes meaning.
pub const GRADE_CONTRACT_VERSION: u32 = 1;

/// Evaluation error recorded when no answer could be recovered.
pub const FAILED_TO_EXTRACT: &str = "failed_to_extract_answer";

/// Evaluation error recorded when the task carries no raw record.
pub const NO_TASK_DATA: &str = "no_task_data";

/// Everything a grader needs to decide correctness.
#[derive(Debug, Clone, Serialize)]
pub struct GradeRequest<'a> {
    pub contract_version: u32,
    pub task_id: &'a str,
    /// The task's full raw record.
    pub task_record: &'a Value,
    /// The extracted answer, JSON-encoded in the grader's format (e.g. `["S1234567"]`).
    pub proposed_answer: String,
    /// The complete interaction history, in order.
    pub history: &'a [HistoryEntry],
    /// Base endpoint of the record service the episode ran against.
    pub base_url: &'a str,
}

impl GradeRequest<'_> {
    /// Decode `proposed_answer` back into JSON.
    pub fn answer(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.proposed_answer)
    }
}

/// Outcome of the answer-evaluation procedure for one episode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub correct: bool,
    pub extracted_answer: Option<Vec<Value>>,
    pub error: Option<String>,
}
