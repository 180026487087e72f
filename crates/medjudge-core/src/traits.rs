//! Boundary traits consumed by the episode manager.
//!
//! These three traits are the only seams between the judge core and the
//! outside world:
//!
//! - `TaskProvider`: where tasks come from
//! - `ToolExecutor`: untrusted-input capability calls against the record service
//! - `Grader`: per-task correctness verdicts
//!
//! The manager owns one boxed instance of each, constructed by the hosting
//! application; there is no process-wide registry.

use std::sync::Arc;

use medjudge_contracts::{
    action::ToolCall,
    capability::CapabilitySpec,
    error::GraderError,
    evaluation::GradeRequest,
    task::Task,
};

/// A read-only pool of tasks.
pub trait TaskProvider: Send + Sync {
    /// Look up a task by its corpus id.
    fn get(&self, task_id: &str) -> Option<Arc<Task>>;

    /// Pick one task uniformly at random. `None` when the pool is empty.
    fn sample(&self) -> Option<Arc<Task>>;

    /// Number of tasks in the pool.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Executes capability calls on behalf of the evaluated agent.
pub trait ToolExecutor: Send + Sync {
    /// The fixed capability menu. Must return the same list on every call.
    fn catalog(&self) -> Vec<CapabilitySpec>;

    /// Execute `call` and return its result as text.
    ///
    /// Implementations must not fail for an unknown capability, a missing
    /// argument, or an unreachable backend: such conditions are reported as
    /// a descriptive `Error: ...` string, because the manager records
    /// whatever text comes back directly into history.
    fn invoke(&self, call: &ToolCall) -> String;

    /// Base endpoint of the record service, e.g. `http://localhost:8080/fhir`.
    ///
    /// Used to render write calls into history and passed to the grader.
    fn base_url(&self) -> &str;
}

/// Decides whether a proposed answer is correct.
pub trait Grader: Send + Sync {
    /// Return the verdict for `request`.
    ///
    /// An `Err` is never fatal: the evaluation procedure records it and
    /// scores the episode 0.0.
    fn evaluate(&self, request: &GradeRequest<'_>) -> Result<bool, GraderError>;
}
