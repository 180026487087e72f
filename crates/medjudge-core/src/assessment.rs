//! The assessment loop: drive one participant through one episode.
//!
//! Flow:
//!
//!   start → [participant.act → session.respond]* → report
//!
//! Progress is reported as a list of `TaskUpdate`s, one per turn plus the
//! start and completion markers. The loop ends when the episode is done, the
//! participant fails, or the participant sends more consecutive unparseable
//! replies than `max_protocol_retries` allows.

use chrono::Utc;
use tracing::{info, warn};

use medjudge_contracts::{
    action::AgentAction,
    episode::StepReason,
    error::{JudgeError, JudgeResult, ParticipantError},
    evaluation::EvaluationRecord,
    report::{EpisodeReport, TaskUpdate},
};
use medjudge_ledger::Transcript;

use crate::session::{JudgeSession, Turn};

/// The agent under evaluation, seen from the judge.
pub trait Participant {
    /// Answer `prompt` with the agent's raw reply text.
    fn act(&mut self, prompt: &str) -> Result<String, ParticipantError>;
}

/// Everything produced by one assessment run.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub updates: Vec<TaskUpdate>,
    pub report: EpisodeReport,
    pub transcript: Transcript,
}

/// Run one episode of `session` against `participant`.
///
/// # Errors
///
/// Only errors from starting the episode (`TaskNotFound`, `EmptyPool`).
/// Participant failures and exhausted protocol retries end the assessment
/// normally with score 0.0 and `report.error` set.
pub fn run_assessment(
    session: &mut JudgeSession,
    participant: &mut dyn Participant,
    task_id: Option<&str>,
    max_protocol_retries: u32,
) -> JudgeResult<Assessment> {
    let max_steps = session.manager().config().max_steps;
    let mut prompt = session.start(task_id, None)?;
    let mut updates = vec![update(0, max_steps, "Episode started".to_string(), false)];

    let mut consecutive_errors = 0u32;
    let mut final_turn: Option<Turn> = None;
    let mut error: Option<String> = None;

    loop {
        let step = current_step(session);

        let reply = match participant.act(&prompt) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(step, error = %e, "participant failed");
                updates.push(update(step, max_steps, format!("Participant communication error: {}", e), true));
                error = Some(format!("participant_error: {}", e));
                break;
            }
        };

        let turn = session.respond(&reply)?;

        if let Some(protocol_error) = &turn.protocol_error {
            consecutive_errors += 1;
            updates.push(update(
                step,
                max_steps,
                format!("Invalid action from participant: {}", protocol_error),
                false,
            ));
            if consecutive_errors > max_protocol_retries {
                warn!(step, consecutive_errors, "protocol retries exhausted");
                error = Some(format!("protocol_retries_exhausted: {}", protocol_error));
                break;
            }
            prompt = turn.prompt;
            continue;
        }
        consecutive_errors = 0;

        let step = current_step(session);
        updates.push(update(step, max_steps, action_status(step, turn.action.as_ref()), false));

        if turn.done {
            updates.push(update(step, max_steps, "Episode completed".to_string(), true));
            final_turn = Some(turn);
            break;
        }
        prompt = turn.prompt;
    }

    let manager = session.manager();
    let ledger = manager.ledger().ok_or(JudgeError::NoActiveEpisode)?;
    let transcript = ledger.seal();
    let task = manager.task().ok_or(JudgeError::NoActiveEpisode)?;

    let (evaluation, score) = match &final_turn {
        Some(turn) => (turn.info.evaluation.clone().unwrap_or_default(), turn.reward),
        None => (EvaluationRecord::default(), 0.0),
    };
    if error.is_none() {
        if let Some(StepReason::StepLimitReached) = final_turn.as_ref().and_then(|t| t.info.reason) {
            error = Some("step_limit_reached".to_string());
        }
    }

    let report = EpisodeReport {
        episode_id: ledger.episode_id(),
        task_id: task.task_id.clone(),
        subject_id: task.subject_id.clone(),
        total_steps: current_step(session),
        evaluation,
        final_summary: manager.final_summary().map(str::to_string),
        score,
        error,
        transcript_hash: transcript.terminal_hash.clone(),
        finished_at: Utc::now(),
    };

    info!(
        episode_id = %report.episode_id,
        task_id = %report.task_id,
        total_steps = report.total_steps,
        score = report.score,
        "assessment complete"
    );

    Ok(Assessment {
        updates,
        report,
        transcript,
    })
}

fn current_step(session: &JudgeSession) -> u32 {
    session.manager().observation().map(|o| o.step).unwrap_or(0)
}

fn action_status(step: u32, action: Option<&AgentAction>) -> String {
    match action {
        Some(AgentAction::CallTool(call)) => format!("Step {}: call_tool - {}", step, call.tool_name),
        Some(AgentAction::Finish(_)) => format!("Step {}: finish", step),
        None => format!("Step {}", step),
    }
}

fn update(step: u32, max_steps: u32, status: String, done: bool) -> TaskUpdate {
    TaskUpdate {
        step,
        max_steps,
        status,
        done,
        timestamp: Utc::now(),
    }
}
