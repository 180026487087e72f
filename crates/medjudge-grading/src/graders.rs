//! The built-in grading strategies.

use serde_json::Value;
use tracing::debug;

use medjudge_contracts::{error::GraderError, evaluation::GradeRequest};

use crate::{
    posts::{extract_posts, has_post},
    rule::{GraderKind, GraderRule},
};

/// Apply `rule` to `request`.
pub fn grade(rule: &GraderRule, request: &GradeRequest<'_>) -> Result<bool, GraderError> {
    match rule.kind {
        GraderKind::ExactMatch => exact_match(rule, request),
        GraderKind::WriteRequired => write_required(rule, request),
        GraderKind::AlwaysPass => Ok(true),
        GraderKind::AlwaysFail => Ok(false),
    }
}

fn exact_match(rule: &GraderRule, request: &GradeRequest<'_>) -> Result<bool, GraderError> {
    if rule.forbid_writes && has_post(request.history, request.base_url) {
        debug!(task_id = %request.task_id, "read-only task issued a write");
        return Ok(false);
    }

    let expected = request.task_record.get("sol").ok_or_else(|| GraderError::InvalidRecord {
        reason: format!("task '{}' has no reference solution 'sol'", request.task_id),
    })?;
    let proposed = parse_answer(request)?;

    Ok(values_match(&proposed, expected))
}

fn write_required(rule: &GraderRule, request: &GradeRequest<'_>) -> Result<bool, GraderError> {
    let posts = extract_posts(request.history, request.base_url);

    let satisfied = posts.iter().any(|post| {
        let type_ok = match &rule.resource_type {
            Some(wanted) => post.resource_type.as_deref() == Some(wanted.as_str()),
            None => true,
        };
        type_ok
            && rule
                .required_payload_fields
                .iter()
                .all(|field| post.payload.get(field).is_some())
    });

    if !satisfied {
        debug!(
            task_id = %request.task_id,
            writes = posts.len(),
            resource_type = ?rule.resource_type,
            "no acknowledged write satisfies the rule"
        );
        return Ok(false);
    }

    match &rule.expect_answer {
        Some(expected) => Ok(values_match(&parse_answer(request)?, expected)),
        None => Ok(true),
    }
}

fn parse_answer(request: &GradeRequest<'_>) -> Result<Value, GraderError> {
    request.answer().map_err(|e| GraderError::InvalidAnswer {
        reason: e.to_string(),
    })
}

/// Structural equality where numbers compare by value, so `2` matches `2.0`.
fn values_match(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_match(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_match(x, y)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::values_match;

    #[test]
    fn numbers_compare_by_value() {
        assert!(values_match(&json!([2]), &json!([2.0])));
        assert!(!values_match(&json!([2]), &json!(["2"])));
    }

    #[test]
    fn nested_structures() {
        assert!(values_match(&json!({ "a": [1, 2.5] }), &json!({ "a": [1.0, 2.5] })));
        assert!(!values_match(&json!({ "a": 1 }), &json!({ "a": 1, "b": 2 })));
        assert!(!values_match(&json!([1, 2]), &json!([2, 1])));
    }
}
