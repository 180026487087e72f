//! Episode configuration loaded from TOML.
//!
//! The `[episode]` table is optional, as is every key in it:
//!
//! ```toml
//! [episode]
//! max_steps = 8
//! max_protocol_retries = 3
//! ```
//!
//! Other top-level tables (for example `[[graders]]`) are ignored here so the
//! same file can configure grading as well.

use std::path::Path;

use serde::{Deserialize, Serialize};

use medjudge_contracts::error::{JudgeError, JudgeResult};

pub const DEFAULT_MAX_STEPS: u32 = 8;
pub const DEFAULT_MAX_PROTOCOL_RETRIES: u32 = 3;

/// Limits applied to every episode run by one manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Maximum number of agent actions per episode. Must be at least 1.
    pub max_steps: u32,
    /// Consecutive unparseable replies tolerated before the assessment loop
    /// gives up on a participant. Does not affect `EpisodeManager` itself.
    pub max_protocol_retries: u32,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            max_protocol_retries: DEFAULT_MAX_PROTOCOL_RETRIES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    episode: EpisodeConfig,
}

impl EpisodeConfig {
    /// Parse the `[episode]` table of a TOML document.
    ///
    /// Returns `JudgeError::Config` if the TOML is malformed, a key has the
    /// wrong type, or `max_steps` is zero.
    pub fn from_toml_str(s: &str) -> JudgeResult<Self> {
        let file: ConfigFile = toml::from_str(s).map_err(|e| JudgeError::Config {
            reason: format!("failed to parse episode TOML: {}", e),
        })?;
        file.episode.validated()
    }

    /// Read the file at `path` and parse its `[episode]` table.
    pub fn from_file(path: &Path) -> JudgeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| JudgeError::Config {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Override the step limit. A limit of 0 is raised to 1, the same floor
    /// `from_toml_str` enforces.
    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    pub(crate) fn validated(self) -> JudgeResult<Self> {
        if self.max_steps == 0 {
            return Err(JudgeError::Config {
                reason: "max_steps must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}
