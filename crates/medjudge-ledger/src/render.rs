//! Canonical text rendering of history entries.
//!
//! The external grader scans history text for these literal shapes, so they
//! are a compatibility surface:
//!
//! ```text
//! POST <base-url>/<resource_type>
//! <payload json>
//!
//! GET <tool_name> with arguments: <arguments json>
//!
//! FINISH: <summary>
//! ```
//!
//! A write call is always answered in history by `WRITE_ACKNOWLEDGMENT`,
//! whatever the record service actually returned.

use serde_json::Value;

use medjudge_contracts::action::ToolCall;

use crate::json::encode;

/// Environment entry recorded for every write call.
pub const WRITE_ACKNOWLEDGMENT: &str = "POST request accepted and executed successfully";

/// Maximum number of characters of a tool result kept in history.
pub const RESULT_BRIEF_LIMIT: usize = 500;

/// Render the agent-side line(s) for a tool call.
pub fn render_tool_call(call: &ToolCall, base_url: &str) -> String {
    if call.is_write() {
        let resource_type = match call.arguments.get("resource_type") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => "Unknown".to_string(),
            Some(other) => encode(other),
        };
        let payload = call
            .arguments
            .get("payload")
            .map(encode)
            .unwrap_or_else(|| "{}".to_string());
        return format!("POST {}/{}\n{}", base_url, resource_type, payload);
    }

    let arguments = encode(&Value::Object(call.arguments.clone()));
    format!("GET {} with arguments: {}", call.tool_name, arguments)
}

/// Render the environment-side entry for a tool result.
pub fn render_tool_result(call: &ToolCall, result: &str) -> String {
    if call.is_write() {
        WRITE_ACKNOWLEDGMENT.to_string()
    } else {
        truncate_brief(result)
    }
}

/// Render the agent-side entry for a finish action. Never truncated.
pub fn render_finish(summary: &str) -> String {
    format!("FINISH: {}", summary)
}

/// Keep the first `RESULT_BRIEF_LIMIT` characters of `text`.
pub fn truncate_brief(text: &str) -> String {
    match text.char_indices().nth(RESULT_BRIEF_LIMIT) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map, Value};

    use medjudge_contracts::action::ToolCall;

    use super::*;

    fn call(name: &str, args: Value) -> ToolCall {
        let arguments = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        ToolCall::new(name, arguments)
    }

    #[test]
    fn write_call_renders_post_line_and_payload() {
        let post = call(
            "post_fhir_resource",
            json!({ "resource_type": "Observation", "payload": { "a": 1 } }),
        );
        assert_eq!(
            render_tool_call(&post, "http://x/fhir"),
            "POST http://x/fhir/Observation\n{\"a\": 1}"
        );
        assert_eq!(render_tool_result(&post, "Success: Created Observation"), WRITE_ACKNOWLEDGMENT);
    }

    #[test]
    fn write_call_defaults_missing_fields() {
        let post = call("post_fhir_resource", json!({}));
        assert_eq!(render_tool_call(&post, "http://x/fhir"), "POST http://x/fhir/Unknown\n{}");
    }

    #[test]
    fn read_call_renders_get_line() {
        let get = call("get_recent_labs", json!({ "patient_id": "S1234567", "lab_code": "MG" }));
        assert_eq!(
            render_tool_call(&get, "http://x/fhir"),
            r#"GET get_recent_labs with arguments: {"patient_id": "S1234567", "lab_code": "MG"}"#
        );
    }

    #[test]
    fn read_call_without_arguments_renders_empty_object() {
        let get = call("get_conditions", json!({}));
        assert_eq!(render_tool_call(&get, "http://x/fhir"), "GET get_conditions with arguments: {}");
    }

    #[test]
    fn finish_is_verbatim() {
        let long = "x".repeat(2_000);
        assert_eq!(render_finish(&long), format!("FINISH: {}", long));
    }

    #[test]
    fn truncation_keeps_first_500_characters() {
        let text = "a".repeat(600);
        let brief = truncate_brief(&text);
        assert_eq!(brief.chars().count(), 500);
        assert_eq!(brief, text[..500]);

        let short = "b".repeat(500);
        assert_eq!(truncate_brief(&short), short);
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "é".repeat(501);
        assert_eq!(truncate_brief(&text).chars().count(), 500);
    }
}
