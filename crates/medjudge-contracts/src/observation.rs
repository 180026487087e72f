//! The observation shown to the agent each turn.

use serde::{Deserialize, Serialize};

use crate::{action::ToolCall, capability::CapabilitySpec};

/// A snapshot of episode state as the agent sees it.
///
/// Built fresh by the episode manager on every turn and never mutated.
/// Field order here is the serialization order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub task_id: String,
    pub task_description: String,
    pub step: u32,
    pub max_steps: u32,
    pub available_tools: Vec<CapabilitySpec>,
    /// The previous tool call, serialized with its `"action": "call_tool"` tag.
    #[serde(default, with = "tagged_call")]
    pub last_tool_call: Option<ToolCall>,
    #[serde(default)]
    pub last_tool_result_brief: Option<String>,
    pub done: bool,
}

mod tagged_call {
    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

    use crate::action::{AgentAction, ToolCall};

    #[derive(Serialize)]
    #[serde(tag = "action", rename_all = "snake_case")]
    enum TaggedRef<'a> {
        CallTool(&'a ToolCall),
    }

    pub fn serialize<S: Serializer>(value: &Option<ToolCall>, serializer: S) -> Result<S::Ok, S::Error> {
        value.as_ref().map(TaggedRef::CallTool).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ToolCall>, D::Error> {
        match Option::<AgentAction>::deserialize(deserializer)? {
            None => Ok(None),
            Some(AgentAction::CallTool(call)) => Ok(Some(call)),
            Some(AgentAction::Finish(_)) => Err(D::Error::custom(
                "last_tool_call must be a call_tool action",
            )),
        }
    }
}
