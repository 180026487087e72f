//! Interaction history entries.

use serde::{Deserialize, Serialize};

/// Who produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The evaluated agent.
    Agent,
    /// The judge's environment (tool results, acknowledgments).
    Environment,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Agent => "agent",
            Role::Environment => "environment",
        }
    }
}

/// One turn fragment of the interaction transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl HistoryEntry {
    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
        }
    }

    pub fn environment(content: impl Into<String>) -> Self {
        Self {
            role: Role::Environment,
            content: content.into(),
        }
    }
}
