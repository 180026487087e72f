//! # medjudge-grading
//!
//! TOML-configured reference graders for medjudge episodes.
//!
//! ## Overview
//!
//! This crate provides [`GraderRegistry`], which implements the
//! [`Grader`](medjudge_core::traits::Grader) trait. Rules are declared per
//! task type in a `[[graders]]` array and the first matching rule wins. A
//! task type with no rule is a grader error, which the evaluation procedure
//! records and scores 0.0.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use medjudge_grading::GraderRegistry;
//!
//! let grader = GraderRegistry::from_file(Path::new("config/medjudge.toml"))?;
//! // Pass `Box::new(grader)` to `medjudge_core::EpisodeManager::new(...)`.
//! ```

pub mod graders;
pub mod posts;
pub mod registry;
pub mod rule;

use medjudge_contracts::error::JudgeResult;

pub use posts::{extract_posts, has_post, PostRecord};
pub use registry::GraderRegistry;
pub use rule::{GraderKind, GraderRule, GradingConfig};

/// Rules for the task types of the bundled sample corpus.
pub const DEFAULT_RULES: &str = include_str!("../config/default.toml");

impl GraderRegistry {
    /// Build a registry from [`DEFAULT_RULES`].
    pub fn builtin() -> JudgeResult<Self> {
        Self::from_toml_str(DEFAULT_RULES)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
