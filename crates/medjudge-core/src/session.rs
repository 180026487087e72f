//! Text-in, text-out wrapper around the episode manager.
//!
//! `JudgeSession` is what a host exposes to an evaluated agent: it renders
//! observations into prompts and parses agent replies into actions. An
//! unparseable reply does not end or advance the episode; the agent gets the
//! same observation back with a note describing what went wrong.

use tracing::warn;

use medjudge_contracts::{
    action::AgentAction,
    episode::StepInfo,
    error::{JudgeError, JudgeResult},
    observation::Observation,
};

use crate::{
    episode::EpisodeManager,
    protocol::{parse_action, serialize_observation},
};

/// Rules shown at the top of every prompt.
pub const INSTRUCTIONS: &str = r#"You are a clinical assistant working against a FHIR record service.
Each turn, reply with exactly one JSON object and nothing else.

To call a tool:
{"action": "call_tool", "tool_name": "<one of available_tools>", "arguments": {...}}

To give your final answer:
{"action": "finish", "final_summary": "FINISH([<answer>, ...])"}

The answer inside FINISH must be a JSON array. Use only tools listed in
available_tools, and finish before max_steps is reached."#;

/// The outcome of one agent reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// Prompt to send to the agent next.
    pub prompt: String,
    pub reward: f64,
    pub done: bool,
    pub info: StepInfo,
    /// The parsed action, when the reply was valid.
    pub action: Option<AgentAction>,
    /// Parse failure description, when it was not.
    pub protocol_error: Option<String>,
}

pub struct JudgeSession {
    manager: EpisodeManager,
}

impl JudgeSession {
    pub fn new(manager: EpisodeManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &EpisodeManager {
        &self.manager
    }

    pub fn into_manager(self) -> EpisodeManager {
        self.manager
    }

    /// Reset the underlying manager and return the first prompt.
    pub fn start(&mut self, task_id: Option<&str>, description_override: Option<&str>) -> JudgeResult<String> {
        let observation = self.manager.reset(task_id, description_override)?;
        Ok(render_prompt(&observation, None))
    }

    /// Feed one agent reply to the episode.
    ///
    /// # Errors
    ///
    /// `JudgeError::NoActiveEpisode` if `start` has not been called. Protocol
    /// errors are reported in the returned `Turn`, not as `Err`.
    pub fn respond(&mut self, text: &str) -> JudgeResult<Turn> {
        let action = match parse_action(text) {
            Ok(action) => action,
            Err(err) => {
                let observation = self.manager.observation().ok_or(JudgeError::NoActiveEpisode)?;
                warn!(
                    task_id = %observation.task_id,
                    step = observation.step,
                    error = %err,
                    "agent reply rejected"
                );
                let note = format!(
                    "Your last reply could not be parsed: {}. Reply with exactly one JSON object as described above.",
                    err
                );
                return Ok(Turn {
                    prompt: render_prompt(&observation, Some(&note)),
                    reward: 0.0,
                    done: observation.done,
                    info: StepInfo::default(),
                    action: None,
                    protocol_error: Some(err.to_string()),
                });
            }
        };

        let transition = self.manager.step(action.clone())?;
        Ok(Turn {
            prompt: render_prompt(&transition.observation, None),
            reward: transition.reward,
            done: transition.done,
            info: transition.info,
            action: Some(action),
            protocol_error: None,
        })
    }
}

/// Build the agent prompt: instructions, optional note, then the observation.
pub fn render_prompt(observation: &Observation, note: Option<&str>) -> String {
    let mut prompt = INSTRUCTIONS.to_string();
    if let Some(note) = note {
        prompt.push_str("\n\n[Note]: ");
        prompt.push_str(note);
    }
    prompt.push_str("\n\n[Observation]:\n");
    prompt.push_str(&serialize_observation(observation));
    prompt.push_str("\n\nReply with exactly one JSON object as your action.");
    prompt
}

#[cfg(test)]
mod tests {
    use medjudge_contracts::{action::AgentAction, error::JudgeError};

    use super::{JudgeSession, INSTRUCTIONS};
    use crate::test_support::manager;

    #[test]
    fn start_renders_instructions_and_observation() {
        let (manager, _) = manager(8);
        let mut session = JudgeSession::new(manager);

        let prompt = session.start(Some("task1_1"), None).unwrap();

        assert!(prompt.starts_with(INSTRUCTIONS));
        assert!(prompt.contains("\"task_id\": \"task1_1\""));
        assert!(!prompt.contains("[Note]"));
    }

    #[test]
    fn valid_reply_advances_episode() {
        let (manager, handles) = manager(8);
        let mut session = JudgeSession::new(manager);
        session.start(Some("task1_1"), None).unwrap();

        let turn = session
            .respond(r#"{"action": "call_tool", "tool_name": "get_patient_basic", "arguments": {"patient_id": "S1234567"}}"#)
            .unwrap();

        assert_eq!(turn.protocol_error, None);
        assert!(matches!(turn.action, Some(AgentAction::CallTool(_))));
        assert!(!turn.done);
        assert!(turn.prompt.contains("\"step\": 1"));
        assert_eq!(handles.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn invalid_reply_keeps_observation_and_adds_note() {
        let (manager, handles) = manager(8);
        let mut session = JudgeSession::new(manager);
        session.start(Some("task1_1"), None).unwrap();

        let turn = session.respond("let me look up the patient first").unwrap();

        assert!(turn.protocol_error.is_some());
        assert_eq!(turn.action, None);
        assert_eq!(turn.reward, 0.0);
        assert!(!turn.done);
        assert!(turn.prompt.contains("[Note]: Your last reply could not be parsed"));
        assert!(turn.prompt.contains("\"step\": 0"));
        assert!(session.manager().history().is_empty());
        assert!(handles.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn finish_reply_reports_reward() {
        let (manager, _) = manager(8);
        let mut session = JudgeSession::new(manager);
        session.start(Some("task1_1"), None).unwrap();

        let turn = session
            .respond("```json\n{\"action\": \"finish\", \"final_summary\": \"FINISH([\\\"S1234567\\\"])\"}\n```")
            .unwrap();

        assert!(turn.done);
        assert_eq!(turn.reward, 1.0);
        assert!(turn.info.evaluation.unwrap().correct);
    }

    #[test]
    fn respond_before_start() {
        let (manager, _) = manager(8);
        let mut session = JudgeSession::new(manager);
        assert!(matches!(session.respond("{}"), Err(JudgeError::NoActiveEpisode)));
    }
}
