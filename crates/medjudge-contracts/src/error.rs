//! Error types for the medjudge runtime.
//!
//! Only a handful of conditions are allowed to surface as hard failures:
//! lookup failures on reset, configuration problems at startup, and malformed
//! task corpora. Everything that happens inside a running episode degrades to
//! a diagnostic value instead, so most variants here are consumed internally.

use thiserror::Error;

/// The unified error type for episode control and startup.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// `reset` was asked for a task id the provider does not know.
    #[error("task '{task_id}' not found in task pool")]
    TaskNotFound { task_id: String },

    /// `reset` was asked to sample from a provider with no tasks.
    #[error("task pool is empty; cannot sample a task")]
    EmptyPool,

    /// `step` was called before any successful `reset`.
    #[error("no active episode; call reset first")]
    NoActiveEpisode,

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// A task record in the corpus does not have the expected shape.
    #[error("invalid task data: {reason}")]
    TaskData { reason: String },
}

/// Convenience alias used throughout the medjudge crates.
pub type JudgeResult<T> = Result<T, JudgeError>;

/// Why an agent's action text was rejected.
///
/// Protocol errors never end an episode. The session layer turns them into a
/// diagnostic note and asks the agent to resubmit.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("action text is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("action must be a JSON object")]
    NotAnObject,

    #[error("action object has no \"action\" field")]
    MissingDiscriminator,

    #[error("unknown action type in JSON: {action}")]
    UnknownAction { action: String },

    #[error("invalid fields for action '{action}': {reason}")]
    InvalidFields { action: String, reason: String },
}

/// Failure raised by a grader.
///
/// The evaluation procedure catches every variant and records it on the
/// evaluation record; none of them escape an episode.
#[derive(Debug, Error)]
pub enum GraderError {
    #[error("no grader registered for task type '{task_type}'")]
    NotRegistered { task_type: String },

    #[error("task record is malformed: {reason}")]
    InvalidRecord { reason: String },

    #[error("proposed answer is malformed: {reason}")]
    InvalidAnswer { reason: String },

    #[error("grader failed: {reason}")]
    Failed { reason: String },

    #[error("grader panicked: {reason}")]
    Panicked { reason: String },
}

/// Failure reported by an evaluated participant during an assessment.
#[derive(Debug, Error)]
pub enum ParticipantError {
    #[error("participant is unreachable: {reason}")]
    Unreachable { reason: String },

    #[error("participant has no further actions")]
    Exhausted,
}
