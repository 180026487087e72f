//! The episode manager: the judge-side state machine for one agent run.
//!
//! Lifecycle:
//!
//!   NotStarted → reset → Running → (finish | step limit) → Done
//!
//! Each `step` consumes exactly one validated `AgentAction`. A tool call is
//! executed, recorded into the history ledger and surfaced on the next
//! observation; a finish is recorded, graded, and ends the episode. Once
//! done, further steps are no-ops. A later `reset` discards the previous
//! episode entirely.
//!
//! Rewards are sparse: every non-finishing step yields 0.0, and the finish
//! step yields the grader's verdict as 1.0 or 0.0.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, info, warn};

use medjudge_contracts::{
    action::{AgentAction, FinishAction, ToolCall},
    capability::CapabilitySpec,
    episode::{EpisodeId, StepInfo, StepReason, Transition},
    error::{JudgeError, JudgeResult},
    history::HistoryEntry,
    observation::Observation,
    task::Task,
};
use medjudge_ledger::HistoryLedger;

use crate::{
    config::EpisodeConfig,
    evaluate::{evaluate_answer, panic_message},
    traits::{Grader, TaskProvider, ToolExecutor},
};

/// Where the manager is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    NotStarted,
    Running,
    Done,
}

/// Mutable state of the current episode. Replaced wholesale on `reset`.
#[derive(Debug)]
struct EpisodeState {
    episode_id: EpisodeId,
    task: Arc<Task>,
    description: String,
    catalog: Vec<CapabilitySpec>,
    step: u32,
    done: bool,
    last_tool_call: Option<ToolCall>,
    last_tool_result_brief: Option<String>,
    final_summary: Option<String>,
    ledger: HistoryLedger,
}

impl EpisodeState {
    fn observation(&self, max_steps: u32) -> Observation {
        Observation {
            task_id: self.task.task_id.clone(),
            task_description: self.description.clone(),
            step: self.step,
            max_steps,
            available_tools: self.catalog.clone(),
            last_tool_call: self.last_tool_call.clone(),
            last_tool_result_brief: self.last_tool_result_brief.clone(),
            done: self.done,
        }
    }
}

/// Drives episodes against one task pool, tool executor and grader.
///
/// The manager is synchronous and single-owner: one manager runs one episode
/// at a time. Hosts that serve several agents concurrently construct one
/// manager per agent; the boundary traits are `Send + Sync` so their
/// implementations can be shared behind `Arc` wrappers.
pub struct EpisodeManager {
    tasks: Box<dyn TaskProvider>,
    tools: Box<dyn ToolExecutor>,
    grader: Box<dyn Grader>,
    config: EpisodeConfig,
    state: Option<EpisodeState>,
}

impl EpisodeManager {
    pub fn new(
        tasks: Box<dyn TaskProvider>,
        tools: Box<dyn ToolExecutor>,
        grader: Box<dyn Grader>,
        config: EpisodeConfig,
    ) -> Self {
        Self {
            tasks,
            tools,
            grader,
            config,
            state: None,
        }
    }

    /// Start a fresh episode and return its initial observation.
    ///
    /// With `task_id`, that task is loaded; otherwise one is sampled from the
    /// pool. `description_override` replaces the generated task description.
    /// All state from any previous episode is discarded.
    ///
    /// # Errors
    ///
    /// `JudgeError::TaskNotFound` for an unknown `task_id`, and
    /// `JudgeError::EmptyPool` when sampling from an empty pool. The previous
    /// episode, if any, is left untouched on error.
    pub fn reset(&mut self, task_id: Option<&str>, description_override: Option<&str>) -> JudgeResult<Observation> {
        let task = match task_id {
            Some(id) => self.tasks.get(id).ok_or_else(|| {
                warn!(task_id = %id, "requested task not found");
                JudgeError::TaskNotFound { task_id: id.to_string() }
            })?,
            None => self.tasks.sample().ok_or(JudgeError::EmptyPool)?,
        };

        let description = match description_override {
            Some(text) => text.to_string(),
            None => task.description(),
        };
        let episode_id = EpisodeId::new();

        info!(
            episode_id = %episode_id,
            task_id = %task.task_id,
            subject_id = %task.subject_id,
            max_steps = self.config.max_steps,
            "episode started"
        );

        let state = EpisodeState {
            episode_id,
            task,
            description,
            catalog: self.tools.catalog(),
            step: 0,
            done: false,
            last_tool_call: None,
            last_tool_result_brief: None,
            final_summary: None,
            ledger: HistoryLedger::new(episode_id),
        };
        let observation = state.observation(self.config.max_steps);
        self.state = Some(state);
        Ok(observation)
    }

    /// Apply one agent action.
    ///
    /// # Pipeline
    ///
    /// 1. If the episode is already done, return the current observation
    ///    unchanged with reward 0.0 and reason `episode_already_done`.
    /// 2. Increment the step counter.
    /// 3. `call_tool`: invoke the executor, record the call and result into
    ///    history, update the last call and result brief. If the step limit
    ///    is now reached, end the episode with reason `step_limit_reached`.
    /// 4. `finish`: record the finish message, end the episode, run the
    ///    evaluation procedure and return its reward and record.
    ///
    /// # Errors
    ///
    /// Only `JudgeError::NoActiveEpisode`, when called before any `reset`.
    /// Tool failures are recorded as result text and grader failures are
    /// recorded in the evaluation; neither aborts the step.
    pub fn step(&mut self, action: AgentAction) -> JudgeResult<Transition> {
        let max_steps = self.config.max_steps;
        let state = self.state.as_mut().ok_or(JudgeError::NoActiveEpisode)?;

        if state.done {
            debug!(
                episode_id = %state.episode_id,
                action = action.kind(),
                "step on finished episode ignored"
            );
            return Ok(Transition {
                observation: state.observation(max_steps),
                reward: 0.0,
                done: true,
                info: StepInfo::with_reason(StepReason::EpisodeAlreadyDone),
            });
        }

        state.step += 1;

        match action {
            AgentAction::CallTool(call) => {
                debug!(
                    episode_id = %state.episode_id,
                    step = state.step,
                    tool = %call.tool_name,
                    "invoking tool"
                );

                let result = invoke_contained(self.tools.as_ref(), &call);
                let brief = state.ledger.record_tool_call(&call, &result, self.tools.base_url());
                state.last_tool_call = Some(call);
                state.last_tool_result_brief = Some(brief);

                if state.step >= max_steps {
                    state.done = true;
                    info!(
                        episode_id = %state.episode_id,
                        step = state.step,
                        "step limit reached without finish"
                    );
                    return Ok(Transition {
                        observation: state.observation(max_steps),
                        reward: 0.0,
                        done: true,
                        info: StepInfo::with_reason(StepReason::StepLimitReached),
                    });
                }

                Ok(Transition {
                    observation: state.observation(max_steps),
                    reward: 0.0,
                    done: false,
                    info: StepInfo::default(),
                })
            }

            AgentAction::Finish(FinishAction { final_summary }) => {
                state.ledger.record_finish(&final_summary);
                state.done = true;

                let (reward, evaluation) = evaluate_answer(
                    self.grader.as_ref(),
                    &state.task,
                    &final_summary,
                    state.ledger.entries(),
                    self.tools.base_url(),
                );

                info!(
                    episode_id = %state.episode_id,
                    task_id = %state.task.task_id,
                    step = state.step,
                    reward,
                    correct = evaluation.correct,
                    "episode finished"
                );

                state.final_summary = Some(final_summary.clone());
                Ok(Transition {
                    observation: state.observation(max_steps),
                    reward,
                    done: true,
                    info: StepInfo {
                        reason: None,
                        final_summary: Some(final_summary),
                        evaluation: Some(evaluation),
                        task_id: Some(state.task.task_id.clone()),
                        subject_id: Some(state.task.subject_id.clone()),
                    },
                })
            }
        }
    }

    pub fn phase(&self) -> EpisodePhase {
        match &self.state {
            None => EpisodePhase::NotStarted,
            Some(s) if s.done => EpisodePhase::Done,
            Some(_) => EpisodePhase::Running,
        }
    }

    /// The observation for the current state, or `None` before any reset.
    pub fn observation(&self) -> Option<Observation> {
        self.state.as_ref().map(|s| s.observation(self.config.max_steps))
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.state.as_ref().map(|s| s.ledger.entries()).unwrap_or(&[])
    }

    pub fn ledger(&self) -> Option<&HistoryLedger> {
        self.state.as_ref().map(|s| &s.ledger)
    }

    pub fn task(&self) -> Option<&Task> {
        self.state.as_ref().map(|s| s.task.as_ref())
    }

    pub fn episode_id(&self) -> Option<EpisodeId> {
        self.state.as_ref().map(|s| s.episode_id)
    }

    /// The finish summary of the current episode, once it has finished.
    pub fn final_summary(&self) -> Option<&str> {
        self.state.as_ref().and_then(|s| s.final_summary.as_deref())
    }

    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    pub fn tasks(&self) -> &dyn TaskProvider {
        self.tasks.as_ref()
    }
}

/// Invoke a tool, turning a panicking executor into an error result string.
fn invoke_contained(tools: &dyn ToolExecutor, call: &ToolCall) -> String {
    panic::catch_unwind(AssertUnwindSafe(|| tools.invoke(call))).unwrap_or_else(|payload| {
        let reason = panic_message(payload.as_ref());
        warn!(tool = %call.tool_name, reason = %reason, "tool executor panicked");
        format!("Error: Tool '{}' failed: {}", call.tool_name, reason)
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use medjudge_contracts::{
        episode::StepReason,
        error::JudgeError,
        evaluation::FAILED_TO_EXTRACT,
        history::{HistoryEntry, Role},
    };
    use medjudge_ledger::WRITE_ACKNOWLEDGMENT;

    use super::EpisodePhase;
    use crate::test_support::{call, finish, manager, manager_over, manager_with, task, BASE_URL};

    // ── Reset ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_reset_initial_observation() {
        let (mut manager, _) = manager(8);
        assert_eq!(manager.phase(), EpisodePhase::NotStarted);

        let obs = manager.reset(Some("task2_3"), None).unwrap();

        assert_eq!(obs.task_id, "task2_3");
        assert_eq!(obs.step, 0);
        assert_eq!(obs.max_steps, 8);
        assert!(!obs.done);
        assert_eq!(obs.last_tool_call, None);
        assert_eq!(obs.last_tool_result_brief, None);
        assert_eq!(obs.available_tools.len(), 2);
        assert_eq!(
            obs.task_description,
            "Patient MRN: S7654321\nTask: What is the MRN of the patient?"
        );
        assert!(manager.history().is_empty());
        assert_eq!(manager.phase(), EpisodePhase::Running);
    }

    #[test]
    fn test_reset_samples_when_no_task_given() {
        let (mut manager, _) = manager(8);
        let obs = manager.reset(None, None).unwrap();
        assert_eq!(obs.task_id, "task1_1");
    }

    #[test]
    fn test_single_task_pool_sampled_and_finished() {
        let (mut manager, handles) = manager_over(vec![task("task4_7", "S2345678")], 8, true, "ok", None);

        let obs = manager.reset(None, None).unwrap();
        assert_eq!(obs.task_id, "task4_7");
        assert_eq!(obs.step, 0);
        assert!(!obs.done);
        let names: Vec<&str> = obs.available_tools.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["get_patient_basic", "post_fhir_resource"]);

        let t = manager.step(finish(r#"FINISH(["42"])"#)).unwrap();
        assert!(t.done);
        assert_eq!(t.reward, 1.0);
        assert_eq!(t.info.evaluation.unwrap().extracted_answer, Some(vec![json!("42")]));
        assert_eq!(handles.graded.lock().unwrap()[0].proposed_answer, r#"["42"]"#);
    }

    #[test]
    fn test_reset_empty_pool() {
        let (mut manager, _) = manager_over(Vec::new(), 8, true, "ok", None);
        match manager.reset(None, None) {
            Err(JudgeError::EmptyPool) => {}
            other => panic!("expected EmptyPool, got {:?}", other),
        }
        assert_eq!(manager.phase(), EpisodePhase::NotStarted);
        assert!(manager.observation().is_none());
    }

    #[test]
    fn test_reset_description_override() {
        let (mut manager, _) = manager(8);
        let obs = manager.reset(Some("task1_1"), Some("Find the patient.")).unwrap();
        assert_eq!(obs.task_description, "Find the patient.");
    }

    #[test]
    fn test_reset_unknown_task() {
        let (mut manager, _) = manager(8);
        match manager.reset(Some("task9_9"), None) {
            Err(JudgeError::TaskNotFound { task_id }) => assert_eq!(task_id, "task9_9"),
            other => panic!("expected TaskNotFound, got {:?}", other),
        }
        assert_eq!(manager.phase(), EpisodePhase::NotStarted);
    }

    #[test]
    fn test_reset_discards_previous_episode() {
        let (mut manager, _) = manager(8);
        manager.reset(Some("task1_1"), None).unwrap();
        manager.step(call("get_patient_basic", json!({ "patient_id": "S1234567" }))).unwrap();
        let first_id = manager.episode_id();

        let obs = manager.reset(Some("task2_3"), None).unwrap();

        assert_eq!(obs.step, 0);
        assert_eq!(obs.last_tool_call, None);
        assert!(manager.history().is_empty());
        assert_ne!(manager.episode_id(), first_id);
    }

    #[test]
    fn test_step_before_reset() {
        let (mut manager, handles) = manager(8);
        assert!(matches!(
            manager.step(call("get_patient_basic", json!({}))),
            Err(JudgeError::NoActiveEpisode)
        ));
        assert!(handles.calls.lock().unwrap().is_empty());
    }

    // ── Tool calls ────────────────────────────────────────────────────────────

    #[test]
    fn test_tool_call_records_history_and_observation() {
        let (mut manager, handles) = manager(8);
        manager.reset(Some("task1_1"), None).unwrap();

        let t = manager
            .step(call("get_patient_basic", json!({ "patient_id": "S1234567" })))
            .unwrap();

        assert_eq!(t.reward, 0.0);
        assert!(!t.done);
        assert_eq!(t.info.reason, None);
        assert_eq!(t.observation.step, 1);
        assert_eq!(
            t.observation.last_tool_call.as_ref().map(|c| c.tool_name.as_str()),
            Some("get_patient_basic")
        );
        assert_eq!(
            t.observation.last_tool_result_brief.as_deref(),
            Some("Patient Basic Information:\n- ID (MRN): S1234567")
        );

        let history = manager.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::Agent);
        assert_eq!(
            history[0].content,
            r#"GET get_patient_basic with arguments: {"patient_id": "S1234567"}"#
        );
        assert_eq!(history[1].role, Role::Environment);
        assert_eq!(handles.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_write_call_rendered_as_post_with_acknowledgment() {
        let (mut manager, _) = manager_with(8, true, "Success: Created Observation with ID 99. Status code: 201", None);
        manager.reset(Some("task1_1"), None).unwrap();

        let t = manager
            .step(call(
                "post_fhir_resource",
                json!({ "resource_type": "Observation", "payload": { "a": 1 } }),
            ))
            .unwrap();

        let history = manager.history();
        assert_eq!(history[0].content, format!("POST {}/Observation\n{{\"a\": 1}}", BASE_URL));
        assert_eq!(history[1].content, WRITE_ACKNOWLEDGMENT);
        assert_eq!(
            t.observation.last_tool_result_brief.as_deref(),
            Some("Success: Created Observation with ID 99. Status code: 201")
        );
    }

    #[test]
    fn test_long_result_truncated_to_500_chars() {
        let long = "x".repeat(600);
        let (mut manager, _) = manager_with(8, true, &long, None);
        manager.reset(Some("task1_1"), None).unwrap();

        let t = manager.step(call("get_patient_basic", json!({}))).unwrap();

        let brief = t.observation.last_tool_result_brief.unwrap();
        assert_eq!(brief.chars().count(), 500);
        assert_eq!(brief, long[..500]);
        assert_eq!(manager.history()[1].content, brief);
    }

    #[test]
    fn test_tool_panic_recorded_as_error_result() {
        let (mut manager, _) = manager_with(8, true, "ok", Some("get_patient_basic"));
        manager.reset(Some("task1_1"), None).unwrap();

        let t = manager.step(call("get_patient_basic", json!({}))).unwrap();

        assert!(!t.done);
        let brief = t.observation.last_tool_result_brief.unwrap();
        assert!(brief.starts_with("Error: Tool 'get_patient_basic' failed"), "brief: {}", brief);
        assert_eq!(manager.history().len(), 2);
    }

    // ── Step limit ────────────────────────────────────────────────────────────

    #[test]
    fn test_step_limit_reached() {
        let (mut manager, _) = manager(2);
        manager.reset(Some("task1_1"), None).unwrap();

        let first = manager.step(call("get_patient_basic", json!({}))).unwrap();
        assert!(!first.done);

        let second = manager.step(call("get_patient_basic", json!({}))).unwrap();
        assert!(second.done);
        assert_eq!(second.reward, 0.0);
        assert_eq!(second.info.reason, Some(StepReason::StepLimitReached));
        assert_eq!(second.observation.step, 2);
        assert!(second.observation.done);
        assert_eq!(manager.phase(), EpisodePhase::Done);
    }

    #[test]
    fn test_single_step_limit_still_allows_finish() {
        let (mut manager, handles) = manager(1);
        manager.reset(Some("task1_1"), None).unwrap();

        let t = manager.step(finish(r#"FINISH(["S1234567"])"#)).unwrap();
        assert!(t.done);
        assert_eq!(t.reward, 1.0);
        assert_eq!(handles.graded.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_steps_after_done_are_idempotent() {
        let (mut manager, handles) = manager(1);
        manager.reset(Some("task1_1"), None).unwrap();
        let last = manager.step(call("get_patient_basic", json!({}))).unwrap();
        let history_len = manager.history().len();

        for action in [call("get_patient_basic", json!({})), finish("[\"S1234567\"]")] {
            let t = manager.step(action).unwrap();
            assert!(t.done);
            assert_eq!(t.reward, 0.0);
            assert_eq!(t.info.reason, Some(StepReason::EpisodeAlreadyDone));
            assert_eq!(t.observation, last.observation);
        }

        assert_eq!(manager.history().len(), history_len);
        assert_eq!(handles.calls.lock().unwrap().len(), 1);
        assert!(handles.graded.lock().unwrap().is_empty());
    }

    // ── Finish ────────────────────────────────────────────────────────────────

    #[test]
    fn test_finish_correct_answer() {
        let (mut manager, handles) = manager(8);
        manager.reset(Some("task1_1"), None).unwrap();
        manager
            .step(call("get_patient_basic", json!({ "patient_id": "S1234567" })))
            .unwrap();

        let t = manager.step(finish(r#"FINISH(["S1234567"])"#)).unwrap();

        assert!(t.done);
        assert_eq!(t.reward, 1.0);
        assert_eq!(t.observation.step, 2);
        assert_eq!(t.info.final_summary.as_deref(), Some(r#"FINISH(["S1234567"])"#));
        assert_eq!(t.info.task_id.as_deref(), Some("task1_1"));
        assert_eq!(t.info.subject_id.as_deref(), Some("S1234567"));

        let evaluation = t.info.evaluation.unwrap();
        assert!(evaluation.correct);
        assert_eq!(evaluation.extracted_answer, Some(vec![json!("S1234567")]));
        assert_eq!(evaluation.error, None);

        // The grader sees the full history including the finish entry.
        let graded = handles.graded.lock().unwrap();
        assert_eq!(graded.len(), 1);
        assert_eq!(graded[0].task_id, "task1_1");
        assert_eq!(graded[0].proposed_answer, r#"["S1234567"]"#);
        assert_eq!(graded[0].base_url, BASE_URL);
        assert_eq!(graded[0].history.len(), 3);
        assert_eq!(
            graded[0].history[2],
            HistoryEntry::agent(r#"FINISH: FINISH(["S1234567"])"#)
        );
        assert_eq!(manager.final_summary(), Some(r#"FINISH(["S1234567"])"#));
    }

    #[test]
    fn test_finish_incorrect_answer() {
        let (mut manager, _) = manager_with(8, false, "ok", None);
        manager.reset(Some("task1_1"), None).unwrap();

        let t = manager.step(finish("42")).unwrap();

        assert!(t.done);
        assert_eq!(t.reward, 0.0);
        let evaluation = t.info.evaluation.unwrap();
        assert!(!evaluation.correct);
        assert_eq!(evaluation.extracted_answer, Some(vec![json!(42)]));
    }

    #[test]
    fn test_finish_without_extractable_answer() {
        let (mut manager, handles) = manager(8);
        manager.reset(Some("task1_1"), None).unwrap();

        let t = manager.step(finish("no structured answer here")).unwrap();

        assert!(t.done);
        assert_eq!(t.reward, 0.0);
        let evaluation = t.info.evaluation.unwrap();
        assert!(!evaluation.correct);
        assert_eq!(evaluation.extracted_answer, None);
        assert_eq!(evaluation.error.as_deref(), Some(FAILED_TO_EXTRACT));
        assert!(handles.graded.lock().unwrap().is_empty());
        // The finish is still recorded.
        assert_eq!(manager.history().len(), 1);
    }

    #[test]
    fn test_history_chain_intact_after_episode() {
        let (mut manager, _) = manager(8);
        manager.reset(Some("task1_1"), None).unwrap();
        manager.step(call("get_patient_basic", json!({}))).unwrap();
        manager.step(finish("[\"S1234567\"]")).unwrap();

        let ledger = manager.ledger().unwrap();
        assert_eq!(ledger.len(), 3);
        assert!(ledger.verify_integrity());
        assert_eq!(ledger.episode_id(), manager.episode_id().unwrap());
    }

    #[test]
    fn test_observation_matches_last_transition() {
        let (mut manager, _) = manager(8);
        assert_eq!(manager.observation(), None);
        manager.reset(Some("task1_1"), None).unwrap();
        let t = manager.step(call("get_patient_basic", json!({}))).unwrap();
        assert_eq!(manager.observation(), Some(t.observation));
    }
}
