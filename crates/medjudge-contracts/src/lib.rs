//! # medjudge-contracts
//!
//! Shared types and contracts for the medjudge evaluation runtime.
//!
//! Every crate in the workspace imports from here. No behavior lives in this
//! crate beyond small constructors; only data definitions and error types.

pub mod action;
pub mod capability;
pub mod episode;
pub mod error;
pub mod evaluation;
pub mod history;
pub mod observation;
pub mod report;
pub mod task;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use action::{AgentAction, FinishAction, ToolCall};
    use capability::CapabilitySpec;
    use episode::{EpisodeId, StepInfo, StepReason};
    use error::{GraderError, JudgeError};
    use history::{HistoryEntry, Role};
    use observation::Observation;
    use task::{task_type_of, Task, UNKNOWN_SUBJECT};

    fn observation(last_tool_call: Option<ToolCall>) -> Observation {
        Observation {
            task_id: "task1_1".to_string(),
            task_description: "Task: find the MRN".to_string(),
            step: 1,
            max_steps: 8,
            available_tools: vec![CapabilitySpec::new("get_patient_basic", "Basic demographics.")],
            last_tool_call,
            last_tool_result_brief: Some("Patient Basic Information".to_string()),
            done: false,
        }
    }

    // ── Task ─────────────────────────────────────────────────────────────────

    #[test]
    fn task_from_record_reads_benchmark_fields() {
        let task = Task::from_record(json!({
            "id": "task2_14",
            "eval_MRN": "S1234567",
            "instruction": "What is the patient's age?",
            "context": "It's 2023-11-13T10:15:00+00:00 now.",
            "sol": [60]
        }))
        .unwrap();

        assert_eq!(task.task_id, "task2_14");
        assert_eq!(task.subject_id, "S1234567");
        assert_eq!(task.reference_answer, json!([60]));
        assert_eq!(task.task_type(), "task2");
        assert_eq!(task.record["id"], "task2_14");
    }

    #[test]
    fn task_without_mrn_uses_unknown_subject() {
        let task = Task::from_record(json!({
            "id": "task1_30",
            "instruction": "Find the MRN of Jane Roe, DOB 1990-01-01."
        }))
        .unwrap();

        assert_eq!(task.subject_id, UNKNOWN_SUBJECT);
        assert_eq!(task.context, "");
        assert_eq!(task.reference_answer, json!([]));
    }

    #[test]
    fn task_missing_instruction_is_rejected() {
        let err = Task::from_record(json!({ "id": "task1_2" })).unwrap_err();
        match err {
            JudgeError::TaskData { reason } => assert!(reason.contains("instruction")),
            other => panic!("expected TaskData, got {:?}", other),
        }
    }

    #[test]
    fn description_orders_subject_context_instruction() {
        let task = Task::from_record(json!({
            "id": "task3_1",
            "eval_MRN": "S7654321",
            "context": "Use LOINC 8480-6.",
            "instruction": "Record the blood pressure."
        }))
        .unwrap();

        assert_eq!(
            task.description(),
            "Patient MRN: S7654321\nContext: Use LOINC 8480-6.\nTask: Record the blood pressure."
        );
    }

    #[test]
    fn description_omits_empty_context() {
        let task = Task::from_record(json!({
            "id": "task1_4",
            "eval_MRN": "S1234567",
            "instruction": "Return the MRN."
        }))
        .unwrap();

        assert_eq!(task.description(), "Patient MRN: S1234567\nTask: Return the MRN.");
    }

    #[test]
    fn task_type_without_underscore_is_whole_id() {
        assert_eq!(task_type_of("smoke"), "smoke");
        assert_eq!(task_type_of("task10_3"), "task10");
    }

    // ── AgentAction / Observation wire shape ─────────────────────────────────

    #[test]
    fn agent_action_uses_action_discriminator() {
        let finish = AgentAction::Finish(FinishAction {
            final_summary: "FINISH([\"42\"])".to_string(),
        });
        let value = serde_json::to_value(&finish).unwrap();
        assert_eq!(value, json!({ "action": "finish", "final_summary": "FINISH([\"42\"])" }));
        assert_eq!(finish.kind(), "finish");
    }

    #[test]
    fn observation_serializes_last_call_with_tag() {
        let mut args = serde_json::Map::new();
        args.insert("patient_id".to_string(), json!("S1234567"));
        let obs = observation(Some(ToolCall::new("get_patient_basic", args)));

        let value = serde_json::to_value(&obs).unwrap();
        assert_eq!(
            value["last_tool_call"],
            json!({ "action": "call_tool", "tool_name": "get_patient_basic", "arguments": { "patient_id": "S1234567" } })
        );

        let decoded: Observation = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, obs);
    }

    #[test]
    fn observation_without_last_call_serializes_null() {
        let value = serde_json::to_value(observation(None)).unwrap();
        assert!(value["last_tool_call"].is_null());
    }

    #[test]
    fn observation_rejects_finish_as_last_call() {
        let mut value = serde_json::to_value(observation(None)).unwrap();
        value["last_tool_call"] = json!({ "action": "finish", "final_summary": "x" });
        assert!(serde_json::from_value::<Observation>(value).is_err());
    }

    // ── StepInfo / HistoryEntry ──────────────────────────────────────────────

    #[test]
    fn empty_step_info_serializes_as_empty_object() {
        assert_eq!(serde_json::to_value(StepInfo::default()).unwrap(), json!({}));
    }

    #[test]
    fn step_reason_is_snake_case() {
        let info = StepInfo::with_reason(StepReason::StepLimitReached);
        assert_eq!(
            serde_json::to_value(info).unwrap(),
            json!({ "reason": "step_limit_reached" })
        );
    }

    #[test]
    fn history_roles_serialize_lowercase() {
        let entry = HistoryEntry::environment("ok");
        assert_eq!(entry.role, Role::Environment);
        assert_eq!(
            serde_json::to_value(entry).unwrap(),
            json!({ "role": "environment", "content": "ok" })
        );
    }

    #[test]
    fn episode_ids_are_unique() {
        let ids: std::collections::HashSet<String> =
            (0..50).map(|_| EpisodeId::new().to_string()).collect();
        assert_eq!(ids.len(), 50);
    }

    // ── Error display messages ───────────────────────────────────────────────

    #[test]
    fn error_task_not_found_display() {
        let err = JudgeError::TaskNotFound { task_id: "task9_9".to_string() };
        assert!(err.to_string().contains("task9_9"));
    }

    #[test]
    fn error_grader_not_registered_display() {
        let err = GraderError::NotRegistered { task_type: "task7".to_string() };
        let msg = err.to_string();
        assert!(msg.contains("no grader registered"));
        assert!(msg.contains("task7"));
    }
}
