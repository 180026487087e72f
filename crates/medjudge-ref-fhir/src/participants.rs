//! Scripted participants for local runs.
//!
//! A `ScriptedParticipant` replays a fixed list of replies and ignores the
//! prompts it receives. `reference_replies` holds a correct solution for each
//! task of the bundled sample corpus, so a full run over the corpus should
//! score 1.0 on every task.

use std::collections::VecDeque;

use serde_json::json;
use tracing::debug;

use medjudge_contracts::error::ParticipantError;
use medjudge_core::assessment::Participant;

/// Replays canned replies in order, then reports exhaustion.
#[derive(Debug, Clone, Default)]
pub struct ScriptedParticipant {
    replies: VecDeque<String>,
    turns: usize,
}

impl ScriptedParticipant {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            turns: 0,
        }
    }

    /// The reference solution for `task_id`, if one is bundled.
    pub fn reference(task_id: &str) -> Option<Self> {
        reference_replies(task_id).map(Self::new)
    }

    /// Number of prompts answered so far.
    pub fn turns(&self) -> usize {
        self.turns
    }

    pub fn remaining(&self) -> usize {
        self.replies.len()
    }
}

impl Participant for ScriptedParticipant {
    fn act(&mut self, _prompt: &str) -> Result<String, ParticipantError> {
        let reply = self.replies.pop_front().ok_or(ParticipantError::Exhausted)?;
        self.turns += 1;
        debug!(turn = self.turns, "scripted reply");
        Ok(reply)
    }
}

// ── Reference solutions ──────────────────────────────────────────────────────

/// Correct reply sequences for the sample corpus, keyed by task id.
pub fn reference_replies(task_id: &str) -> Option<Vec<String>> {
    let replies = match task_id {
        "task1_1" => vec![
            call("get_patient_basic", json!({ "patient_id": "S1234567" })),
            finish(r#"The patient's MRN is FINISH(["S1234567"])"#),
        ],
        "task1_2" => vec![finish(r#"FINISH(["Patient not found"])"#)],
        "task2_1" => vec![
            call("get_patient_basic", json!({ "patient_id": "S7654321" })),
            finish("Born 1985-09-30, so the patient is FINISH([38]) years old."),
        ],
        "task3_1" => vec![
            call(
                "post_fhir_resource",
                json!({
                    "resource_type": "Observation",
                    "payload": {
                        "resourceType": "Observation",
                        "category": [{
                            "coding": [{
                                "system": "http://hl7.org/fhir/observation-category",
                                "code": "vital-signs",
                                "display": "Vital Signs"
                            }]
                        }],
                        "code": { "text": "BP" },
                        "effectiveDateTime": "2023-11-13T10:15:00+00:00",
                        "status": "final",
                        "valueString": "118/77 mmHg",
                        "subject": { "reference": "Patient/S1234567" }
                    }
                }),
            ),
            finish("Blood pressure recorded. FINISH([])"),
        ],
        "task4_1" => vec![
            call("get_recent_labs", json!({ "patient_id": "S2345678", "lab_code": "MG" })),
            finish("Latest magnesium at 02:30 today: FINISH([1.8])"),
        ],
        "task4_2" => vec![
            call("get_recent_labs", json!({ "patient_id": "S1234567", "lab_code": "MG" })),
            finish("No magnesium in the last 24 hours. FINISH([-1])"),
        ],
        "task5_1" => vec![
            call("get_recent_labs", json!({ "patient_id": "S7654321", "lab_code": "MG" })),
            call(
                "post_fhir_resource",
                json!({
                    "resource_type": "MedicationRequest",
                    "payload": {
                        "resourceType": "MedicationRequest",
                        "status": "active",
                        "intent": "order",
                        "medicationCodeableConcept": {
                            "coding": [{
                                "system": "http://hl7.org/fhir/sid/ndc",
                                "code": "0338-1715-40"
                            }]
                        },
                        "authoredOn": "2023-11-13T10:15:00+00:00",
                        "dosageInstruction": [{
                            "route": { "text": "IV" },
                            "doseAndRate": [{
                                "doseQuantity": { "value": 2, "unit": "g" },
                                "rateQuantity": { "value": 2, "unit": "h" }
                            }]
                        }],
                        "subject": { "reference": "Patient/S7654321" }
                    }
                }),
            ),
            finish("Magnesium 1.3 mg/dL is a moderate deficiency; ordered 2 g IV over 2 hours. FINISH([])"),
        ],
        _ => return None,
    };
    Some(replies)
}

fn call(tool_name: &str, arguments: serde_json::Value) -> String {
    json!({ "action": "call_tool", "tool_name": tool_name, "arguments": arguments }).to_string()
}

fn finish(summary: &str) -> String {
    json!({ "action": "finish", "final_summary": summary }).to_string()
}
