//! The evaluation procedure run when an agent finishes.
//!
//! Evaluation never fails: every problem (no task record, nothing
//! extractable, a grader error, a grader panic) is folded into the returned
//! `EvaluationRecord` with a reward of 0.0.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::{info, warn};

use medjudge_contracts::{
    error::GraderError,
    evaluation::{EvaluationRecord, GradeRequest, FAILED_TO_EXTRACT, GRADE_CONTRACT_VERSION, NO_TASK_DATA},
    history::HistoryEntry,
    task::Task,
};
use medjudge_ledger::json;

use crate::{extract::extract_answer, traits::Grader};

/// Grade `final_summary` for `task` and return `(reward, evaluation)`.
///
/// `history` must be the full episode history including the finish entry;
/// the grader sees it unmodified.
pub fn evaluate_answer(
    grader: &dyn Grader,
    task: &Task,
    final_summary: &str,
    history: &[HistoryEntry],
    base_url: &str,
) -> (f64, EvaluationRecord) {
    let mut evaluation = EvaluationRecord::default();

    if task.record.is_null() {
        warn!(task_id = %task.task_id, "task has no record to grade against");
        evaluation.error = Some(NO_TASK_DATA.to_string());
        return (0.0, evaluation);
    }

    let Some(answer) = extract_answer(final_summary) else {
        info!(task_id = %task.task_id, "no answer could be extracted from final summary");
        evaluation.error = Some(FAILED_TO_EXTRACT.to_string());
        return (0.0, evaluation);
    };

    let request = GradeRequest {
        contract_version: GRADE_CONTRACT_VERSION,
        task_id: &task.task_id,
        task_record: &task.record,
        proposed_answer: json::encode(&Value::Array(answer.clone())),
        history,
        base_url,
    };
    evaluation.extracted_answer = Some(answer);

    let verdict = panic::catch_unwind(AssertUnwindSafe(|| grader.evaluate(&request))).unwrap_or_else(|payload| {
        Err(GraderError::Panicked {
            reason: panic_message(payload.as_ref()),
        })
    });

    match verdict {
        Ok(correct) => {
            info!(
                task_id = %task.task_id,
                proposed_answer = %request.proposed_answer,
                correct,
                "answer graded"
            );
            evaluation.correct = correct;
            (if correct { 1.0 } else { 0.0 }, evaluation)
        }
        Err(e) => {
            warn!(task_id = %task.task_id, error = %e, "grader raised an error");
            evaluation.error = Some(format!("evaluation_exception: {}", e));
            (0.0, evaluation)
        }
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
