//! Answer extraction from free-form finish summaries.
//!
//! Agents are asked to finish with `FINISH([...])`, but in practice they
//! produce anything from a bare JSON array to a sentence mentioning an MRN.
//! Extraction tries four strategies in a fixed order and the first success
//! wins:
//!
//! 1. the first bracketed span (one level of nested brackets) that parses as
//!    a JSON array
//! 2. the inside of a case-insensitive `FINISH(...)` marker, parsed as JSON
//!    (an array is kept, a scalar is wrapped)
//! 3. the whole trimmed summary parsed as JSON (same array/scalar rule)
//! 4. a token heuristic: a labeled value (`answer: X`, `MRN is X`, ...), then
//!    a patient identifier, then a plain number; the token is wrapped as a
//!    single string
//!
//! Malformed input never errors, it simply yields `None`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

static BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:[^\[\]]*|\[[^\[\]]*\])*\]").expect("bracketed-span pattern is valid")
});

static FINISH_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)FINISH\s*\((.*?)\)").expect("finish-marker pattern is valid"));

// Only the label is case-insensitive; the captured value must be an
// upper-case identifier or a number so ordinary prose is not mistaken for one.
static LABELED_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i:answer|result|mrn|value)(?i:\s+is)?:?\s*["']?([A-Z0-9][A-Z0-9\-]+)"#)
        .expect("labeled-value pattern is valid")
});

static PATIENT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(S[0-9]{7})\b").expect("patient-id pattern is valid"));

static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]+(?:\.[0-9]+)?)\b").expect("number pattern is valid"));

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?'];

/// Which strategy produced an extracted answer. Reported in debug logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Bracketed,
    FinishMarker,
    WholeText,
    Heuristic,
}

/// Extract a structured answer list from a finish summary.
pub fn extract_answer(text: &str) -> Option<Vec<Value>> {
    extract_with_strategy(text).map(|(answer, _)| answer)
}

/// Like [`extract_answer`], also reporting which strategy matched.
pub fn extract_with_strategy(text: &str) -> Option<(Vec<Value>, Strategy)> {
    if text.trim().is_empty() {
        return None;
    }

    let found = from_bracketed(text)
        .map(|a| (a, Strategy::Bracketed))
        .or_else(|| from_finish_marker(text).map(|a| (a, Strategy::FinishMarker)))
        .or_else(|| from_whole_text(text).map(|a| (a, Strategy::WholeText)))
        .or_else(|| from_heuristic(text).map(|a| (a, Strategy::Heuristic)));

    match &found {
        Some((answer, strategy)) => debug!(?strategy, items = answer.len(), "answer extracted"),
        None => debug!("no answer could be extracted"),
    }
    found
}

fn from_bracketed(text: &str) -> Option<Vec<Value>> {
    BRACKETED
        .find_iter(text)
        .find_map(|m| match serde_json::from_str::<Value>(m.as_str()) {
            Ok(Value::Array(items)) => Some(items),
            _ => None,
        })
}

fn from_finish_marker(text: &str) -> Option<Vec<Value>> {
    let inner = FINISH_MARKER.captures(text)?.get(1)?.as_str().trim();
    parse_as_list(inner)
}

fn from_whole_text(text: &str) -> Option<Vec<Value>> {
    parse_as_list(text.trim())
}

fn from_heuristic(text: &str) -> Option<Vec<Value>> {
    let token = [&*LABELED_VALUE, &*PATIENT_ID, &*NUMBER]
        .iter()
        .find_map(|re| re.captures(text).and_then(|c| c.get(1)))?
        .as_str()
        .trim_end_matches(TRAILING_PUNCTUATION);

    if token.is_empty() {
        return None;
    }
    Some(vec![Value::String(token.to_string())])
}

/// Parse `text` as JSON: an array is returned as-is, any other value wrapped.
fn parse_as_list(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(items),
        scalar => Some(vec![scalar]),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{extract_answer, extract_with_strategy, Strategy};

    #[test]
    fn finish_marker_with_array() {
        assert_eq!(extract_answer(r#"FINISH(["S1234567"])"#), Some(vec![json!("S1234567")]));
    }

    #[test]
    fn bracketed_span_inside_prose() {
        let (answer, strategy) =
            extract_with_strategy(r#"The answer is ["S1234567"] based on the records."#).unwrap();
        assert_eq!(answer, vec![json!("S1234567")]);
        assert_eq!(strategy, Strategy::Bracketed);
    }

    #[test]
    fn bare_number_is_parsed_as_json() {
        assert_eq!(extract_answer("42"), Some(vec![json!(42)]));
    }

    #[test]
    fn finish_marker_wraps_scalar() {
        let (answer, strategy) = extract_with_strategy("finish( 2.3 )").unwrap();
        assert_eq!(answer, vec![json!(2.3)]);
        assert_eq!(strategy, Strategy::FinishMarker);
    }

    #[test]
    fn whole_text_scalar_is_wrapped() {
        assert_eq!(extract_answer(r#"  "S7654321"  "#), Some(vec![json!("S7654321")]));
    }

    #[test]
    fn labeled_value_heuristic() {
        assert_eq!(extract_answer("MRN: S1234567."), Some(vec![json!("S1234567")]));
        assert_eq!(extract_answer("The result is 75."), Some(vec![json!("75")]));
        assert_eq!(extract_answer("The answer is S7654321."), Some(vec![json!("S7654321")]));
    }

    #[test]
    fn labeled_value_must_be_upper_case_or_numeric() {
        assert_eq!(extract_answer("The answer is abc"), None);
        assert_eq!(extract_answer("answer is 5"), Some(vec![json!("5")]));
        let (answer, strategy) = extract_with_strategy("ANSWER: s1234567").unwrap();
        assert_eq!(answer, vec![json!("s1234567")]);
        assert_eq!(strategy, Strategy::Heuristic);
    }

    #[test]
    fn patient_identifier_heuristic() {
        let (answer, strategy) = extract_with_strategy("I believe the patient is S7654321 overall").unwrap();
        assert_eq!(answer, vec![json!("S7654321")]);
        assert_eq!(strategy, Strategy::Heuristic);
    }

    #[test]
    fn number_heuristic_keeps_decimal() {
        assert_eq!(extract_answer("Latest magnesium was 1.8 mg/dL"), Some(vec![json!("1.8")]));
    }

    #[test]
    fn first_parseable_bracket_wins() {
        let text = r#"see [not json] then ["A", ["B"]] and [1]"#;
        assert_eq!(extract_answer(text), Some(vec![json!("A"), json!(["B"])]));
    }

    #[test]
    fn empty_array_is_a_valid_answer() {
        assert_eq!(extract_answer("FINISH([])"), Some(vec![]));
    }

    #[test]
    fn prose_without_values_yields_none() {
        assert_eq!(extract_answer("no structured answer here"), None);
    }

    #[test]
    fn empty_and_blank_yield_none() {
        assert_eq!(extract_answer(""), None);
        assert_eq!(extract_answer("   \n"), None);
    }
}
