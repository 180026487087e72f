//! TOML-driven grader registry.
//!
//! `GraderRegistry` loads a `GradingConfig` from a TOML string or file and
//! implements the `Grader` trait from medjudge-core.
//!
//! Resolution:
//!
//! 1. Derive the task type from the task id (`task3_12` → `task3`).
//! 2. Apply the first rule whose `task_type` matches.
//! 3. If no rule matches → `GraderError::NotRegistered`.

use std::path::Path;

use tracing::{debug, warn};

use medjudge_contracts::{
    error::{GraderError, JudgeError, JudgeResult},
    evaluation::GradeRequest,
    task::task_type_of,
};
use medjudge_core::traits::Grader;

use crate::{
    graders::grade,
    rule::{GraderRule, GradingConfig},
};

/// A `Grader` that dispatches on task type according to TOML rules.
///
/// ```rust,ignore
/// use medjudge_grading::GraderRegistry;
///
/// let grader = GraderRegistry::from_file(Path::new("config/medjudge.toml"))?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct GraderRegistry {
    config: GradingConfig,
}

impl GraderRegistry {
    pub fn new(config: GradingConfig) -> Self {
        Self { config }
    }

    /// Parse the `[[graders]]` array of a TOML document.
    ///
    /// Returns `JudgeError::Config` if the TOML is malformed or a rule does
    /// not match the `GraderRule` schema. Other tables are ignored.
    pub fn from_toml_str(s: &str) -> JudgeResult<Self> {
        let config: GradingConfig = toml::from_str(s).map_err(|e| JudgeError::Config {
            reason: format!("failed to parse grading TOML: {}", e),
        })?;
        Ok(Self { config })
    }

    /// Read the file at `path` and parse its grading rules.
    pub fn from_file(path: &Path) -> JudgeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| JudgeError::Config {
            reason: format!("failed to read grading file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn rules(&self) -> &[GraderRule] {
        &self.config.graders
    }

    /// The rule that grades tasks of `task_type`, if any.
    pub fn resolve(&self, task_type: &str) -> Option<&GraderRule> {
        self.config.graders.iter().find(|r| r.matches(task_type))
    }
}

impl Grader for GraderRegistry {
    fn evaluate(&self, request: &GradeRequest<'_>) -> Result<bool, GraderError> {
        let task_type = task_type_of(request.task_id);

        let Some(rule) = self.resolve(task_type) else {
            warn!(task_id = %request.task_id, task_type, "no grader registered");
            return Err(GraderError::NotRegistered {
                task_type: task_type.to_string(),
            });
        };

        debug!(
            task_id = %request.task_id,
            task_type,
            kind = ?rule.kind,
            "grading with rule"
        );
        grade(rule, request)
    }
}
