//! The action/observation text protocol.
//!
//! Agents answer with one JSON object per turn. Models often wrap that object
//! in a markdown code fence, so a leading fence line and a trailing fence are
//! tolerated and stripped before parsing.

use serde_json::Value;

use medjudge_contracts::{action::AgentAction, error::ProtocolError, observation::Observation};

const FENCE: &str = "```";

/// Parse agent text into a validated `AgentAction`.
///
/// Accepts exactly one JSON object whose `action` field is `"call_tool"`
/// (requires string `tool_name`, optional object `arguments`) or `"finish"`
/// (requires string `final_summary`). Unrecognized extra fields are ignored.
pub fn parse_action(text: &str) -> Result<AgentAction, ProtocolError> {
    let body = strip_code_fence(text.trim());
    let value: Value = serde_json::from_str(body)?;

    let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;
    let action = match object.get("action") {
        None | Some(Value::Null) => return Err(ProtocolError::MissingDiscriminator),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    if !matches!(action.as_str(), "call_tool" | "finish") {
        return Err(ProtocolError::UnknownAction { action });
    }

    serde_json::from_value(value).map_err(|e| ProtocolError::InvalidFields {
        action,
        reason: e.to_string(),
    })
}

/// Serialize an observation for embedding in a prompt.
///
/// Pretty-printed with two-space indentation, fields in declaration order,
/// non-ASCII text kept as-is. Stable for equal inputs.
///
/// # Panics
///
/// Panics if serialization fails, which cannot happen for `Observation`:
/// every field is a string, number, bool or a map with string keys.
pub fn serialize_observation(observation: &Observation) -> String {
    serde_json::to_string_pretty(observation).expect("Observation must always be serializable to JSON")
}

/// Drop a leading fence line (with optional language tag) and a trailing fence.
fn strip_code_fence(text: &str) -> &str {
    if !text.starts_with(FENCE) {
        return text;
    }

    let mut body = match text.find('\n') {
        Some(idx) => &text[idx + 1..],
        None => text,
    };
    if let Some(stripped) = body.trim_end().strip_suffix(FENCE) {
        body = stripped;
    }
    body
}
