//! Agent actions.
//!
//! An evaluated agent may do exactly two things per turn: call a tool or
//! finish. The wire form is a JSON object discriminated by `action`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::capability::WRITE_CAPABILITY;

/// Tool arguments: always a JSON object, insertion order preserved.
pub type Arguments = Map<String, Value>;

/// A request to invoke one capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// Return the argument `key` as a non-empty string.
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// True when this call targets the resource-creation capability.
    pub fn is_write(&self) -> bool {
        self.tool_name == WRITE_CAPABILITY
    }
}

/// The terminal action carrying the agent's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishAction {
    pub final_summary: String,
}

/// The closed set of actions an agent may submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AgentAction {
    CallTool(ToolCall),
    Finish(FinishAction),
}

impl AgentAction {
    /// The wire discriminator for this action.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentAction::CallTool(_) => "call_tool",
            AgentAction::Finish(_) => "finish",
        }
    }
}
