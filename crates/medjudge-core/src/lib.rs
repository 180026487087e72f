//! # medjudge-core
//!
//! The judge side of the medjudge agent-evaluation protocol.
//!
//! This crate provides:
//! - The three boundary traits (`TaskProvider`, `ToolExecutor`, `Grader`)
//! - The `EpisodeManager` state machine that runs one episode at a time
//! - The text protocol (`parse_action`, `serialize_observation`)
//! - Answer extraction and the evaluation procedure run on finish
//! - `JudgeSession` and `run_assessment` for hosting a participant
//!
//! ## Usage
//!
//! ```rust,ignore
//! use medjudge_core::{EpisodeConfig, EpisodeManager, JudgeSession};
//!
//! let manager = EpisodeManager::new(tasks, tools, grader, EpisodeConfig::default());
//! let mut session = JudgeSession::new(manager);
//! let prompt = session.start(Some("task1_1"), None)?;
//! let turn = session.respond(&reply_from_agent)?;
//! ```

pub mod assessment;
pub mod config;
pub mod episode;
pub mod evaluate;
pub mod extract;
pub mod protocol;
pub mod session;
pub mod traits;

#[cfg(test)]
mod test_support;

pub use assessment::{run_assessment, Assessment, Participant};
pub use config::EpisodeConfig;
pub use episode::{EpisodeManager, EpisodePhase};
pub use evaluate::evaluate_answer;
pub use extract::extract_answer;
pub use protocol::{parse_action, serialize_observation};
pub use session::{render_prompt, JudgeSession, Turn};
pub use traits::{Grader, TaskProvider, ToolExecutor};
