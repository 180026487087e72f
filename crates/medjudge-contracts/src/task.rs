//! Task definitions.
//!
//! A `Task` is loaded once from the corpus and never changes afterwards.
//! Episodes hold it behind an `Arc` for their whole lifetime.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{JudgeError, JudgeResult};

/// Subject identifier used when a task has no patient attached
/// (e.g. "patient not found" cases).
pub const UNKNOWN_SUBJECT: &str = "UNKNOWN";

/// One task from the benchmark corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Corpus identifier, e.g. `task1_7`.
    pub task_id: String,
    /// Patient MRN, or `UNKNOWN_SUBJECT`.
    pub subject_id: String,
    /// What the agent is asked to do.
    pub instruction: String,
    /// Optional background; empty when the record carries none.
    pub context: String,
    /// The record's reference solution. Opaque to the runtime.
    pub reference_answer: Value,
    /// The full raw record, forwarded untouched to the grader.
    pub record: Value,
}

impl Task {
    /// Build a task from a corpus record.
    ///
    /// Expects the benchmark layout: `id` and `instruction` are required
    /// strings; `eval_MRN`, `context` and `sol` are optional.
    pub fn from_record(record: Value) -> JudgeResult<Self> {
        let field = |key: &str| record.get(key).and_then(Value::as_str);

        let task_id = field("id")
            .ok_or_else(|| JudgeError::TaskData {
                reason: "record is missing string field 'id'".to_string(),
            })?
            .to_string();

        let instruction = field("instruction")
            .ok_or_else(|| JudgeError::TaskData {
                reason: format!("task '{}' is missing string field 'instruction'", task_id),
            })?
            .to_string();

        let subject_id = field("eval_MRN").unwrap_or(UNKNOWN_SUBJECT).to_string();
        let context = field("context").unwrap_or_default().to_string();
        let reference_answer = record
            .get("sol")
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));

        Ok(Self {
            task_id,
            subject_id,
            instruction,
            context,
            reference_answer,
            record,
        })
    }

    /// The task family this task belongs to, e.g. `task1` for `task1_7`.
    pub fn task_type(&self) -> &str {
        task_type_of(&self.task_id)
    }

    /// Build the description shown to the agent.
    ///
    /// Lines are always in the order subject, context, instruction; the
    /// context line is omitted when the task has none.
    pub fn description(&self) -> String {
        let mut parts = vec![format!("Patient MRN: {}", self.subject_id)];
        if !self.context.is_empty() {
            parts.push(format!("Context: {}", self.context));
        }
        parts.push(format!("Task: {}", self.instruction));
        parts.join("\n")
    }
}

/// Return the prefix of `task_id` before the first underscore.
pub fn task_type_of(task_id: &str) -> &str {
    task_id.split('_').next().unwrap_or(task_id)
}
