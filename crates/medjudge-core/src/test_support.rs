//! Mock boundary implementations shared by the unit tests in this crate.

use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};

use medjudge_contracts::{
    action::{AgentAction, FinishAction, ToolCall},
    capability::{CapabilitySpec, WRITE_CAPABILITY},
    error::GraderError,
    evaluation::GradeRequest,
    history::HistoryEntry,
    task::Task,
};

use crate::{
    config::EpisodeConfig,
    episode::EpisodeManager,
    traits::{Grader, TaskProvider, ToolExecutor},
};

pub const BASE_URL: &str = "http://mock/fhir";

/// A fixed pool; `sample` always returns the first task.
pub struct MockTasks {
    pub tasks: Vec<Arc<Task>>,
}

impl TaskProvider for MockTasks {
    fn get(&self, task_id: &str) -> Option<Arc<Task>> {
        self.tasks.iter().find(|t| t.task_id == task_id).cloned()
    }

    fn sample(&self) -> Option<Arc<Task>> {
        self.tasks.first().cloned()
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }
}

/// Records every invocation and answers with a canned result.
pub struct MockTools {
    pub calls: Arc<Mutex<Vec<ToolCall>>>,
    pub result: String,
    /// Tool name that panics when invoked.
    pub panic_on: Option<String>,
}

impl ToolExecutor for MockTools {
    fn catalog(&self) -> Vec<CapabilitySpec> {
        vec![
            CapabilitySpec::new("get_patient_basic", "Basic demographics for a patient."),
            CapabilitySpec::new(WRITE_CAPABILITY, "Create a resource on the record service."),
        ]
    }

    fn invoke(&self, call: &ToolCall) -> String {
        if self.panic_on.as_deref() == Some(call.tool_name.as_str()) {
            panic!("backend connection reset");
        }
        self.calls.lock().unwrap().push(call.clone());
        self.result.clone()
    }

    fn base_url(&self) -> &str {
        BASE_URL
    }
}

/// What a grader saw for one evaluation.
#[derive(Debug, Clone)]
pub struct GradeSeen {
    pub task_id: String,
    pub proposed_answer: String,
    pub history: Vec<HistoryEntry>,
    pub base_url: String,
}

/// Returns a fixed verdict and records each request.
pub struct StubGrader {
    pub verdict: bool,
    pub seen: Arc<Mutex<Vec<GradeSeen>>>,
}

impl Grader for StubGrader {
    fn evaluate(&self, request: &GradeRequest<'_>) -> Result<bool, GraderError> {
        self.seen.lock().unwrap().push(GradeSeen {
            task_id: request.task_id.to_string(),
            proposed_answer: request.proposed_answer.clone(),
            history: request.history.to_vec(),
            base_url: request.base_url.to_string(),
        });
        Ok(self.verdict)
    }
}

/// Handles onto the mocks wired into a test manager.
pub struct Handles {
    pub calls: Arc<Mutex<Vec<ToolCall>>>,
    pub graded: Arc<Mutex<Vec<GradeSeen>>>,
}

pub fn task(id: &str, mrn: &str) -> Arc<Task> {
    Arc::new(
        Task::from_record(json!({
            "id": id,
            "eval_MRN": mrn,
            "instruction": "What is the MRN of the patient?",
            "context": "",
            "sol": [mrn]
        }))
        .unwrap(),
    )
}

pub fn manager_with(max_steps: u32, verdict: bool, tool_result: &str, panic_on: Option<&str>) -> (EpisodeManager, Handles) {
    let pool = vec![task("task1_1", "S1234567"), task("task2_3", "S7654321")];
    manager_over(pool, max_steps, verdict, tool_result, panic_on)
}

/// A manager over an explicit task pool.
pub fn manager_over(
    tasks: Vec<Arc<Task>>,
    max_steps: u32,
    verdict: bool,
    tool_result: &str,
    panic_on: Option<&str>,
) -> (EpisodeManager, Handles) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let graded = Arc::new(Mutex::new(Vec::new()));

    let manager = EpisodeManager::new(
        Box::new(MockTasks { tasks }),
        Box::new(MockTools {
            calls: Arc::clone(&calls),
            result: tool_result.to_string(),
            panic_on: panic_on.map(str::to_string),
        }),
        Box::new(StubGrader {
            verdict,
            seen: Arc::clone(&graded),
        }),
        EpisodeConfig::default().with_max_steps(max_steps),
    );

    (manager, Handles { calls, graded })
}

pub fn manager(max_steps: u32) -> (EpisodeManager, Handles) {
    manager_with(max_steps, true, "Patient Basic Information:\n- ID (MRN): S1234567", None)
}

pub fn call(name: &str, args: Value) -> AgentAction {
    let arguments = match args {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    AgentAction::CallTool(ToolCall::new(name, arguments))
}

pub fn finish(summary: &str) -> AgentAction {
    AgentAction::Finish(FinishAction {
        final_summary: summary.to_string(),
    })
}
