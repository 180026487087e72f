//! Grader rule types and configuration schema.
//!
//! A `GradingConfig` is deserialized from TOML and holds an ordered list of
//! `GraderRule`s, one per task type. Rules are tried in declaration order and
//! the first rule whose `task_type` matches is used.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a task type is graded.
///
/// Expressed in TOML as a kebab-case string:
/// ```toml
/// kind = "exact-match"
/// kind = "write-required"
/// kind = "always-pass"
/// kind = "always-fail"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraderKind {
    /// The proposed answer must equal the task's reference solution (`sol`).
    ExactMatch,
    /// The agent must have created a resource through an acknowledged write.
    WriteRequired,
    AlwaysPass,
    AlwaysFail,
}

/// One grading rule loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraderRule {
    /// Task type this rule applies to (the task id prefix, e.g. `task1`).
    /// `"*"` matches any task type.
    pub task_type: String,

    #[serde(default)]
    pub description: String,

    pub kind: GraderKind,

    /// `exact-match` only: fail if the agent issued any acknowledged write.
    /// Read-only tasks must not modify the record.
    #[serde(default)]
    pub forbid_writes: bool,

    /// `write-required` only: the resource type the write must target,
    /// e.g. `Observation`. Any type is accepted when absent.
    pub resource_type: Option<String>,

    /// `write-required` only: top-level payload keys that must be present.
    #[serde(default)]
    pub required_payload_fields: Vec<String>,

    /// `write-required` only: the proposed answer must equal this value.
    /// Any answer is accepted when absent.
    pub expect_answer: Option<Value>,
}

impl GraderRule {
    /// Return true if this rule grades tasks of `task_type`.
    pub fn matches(&self, task_type: &str) -> bool {
        self.task_type == "*" || self.task_type == task_type
    }
}

/// The `[[graders]]` array of a TOML configuration file.
///
/// Example:
/// ```toml
/// [[graders]]
/// task_type = "task1"
/// description = "Patient lookup by name and birth date"
/// kind = "exact-match"
/// forbid_writes = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradingConfig {
    /// Ordered list of rules. First match wins.
    #[serde(default)]
    pub graders: Vec<GraderRule>,
}
