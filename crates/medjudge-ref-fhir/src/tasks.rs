//! Task pool loaded from a benchmark corpus file.
//!
//! The corpus is a JSON array of records with `id`, `instruction` and
//! optional `eval_MRN`, `context` and `sol`. Records are parsed once at load;
//! the pool is read-only afterwards.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde_json::Value;
use tracing::info;

use medjudge_contracts::{
    error::{JudgeError, JudgeResult},
    task::Task,
};
use medjudge_core::traits::TaskProvider;

/// The bundled sample corpus.
pub const SAMPLE_TASKS: &str = include_str!("../data/sample_tasks.json");

/// An in-memory `TaskProvider` with uniform random sampling.
#[derive(Debug)]
pub struct TaskPool {
    tasks: Vec<Arc<Task>>,
    rng: Mutex<StdRng>,
}

impl TaskPool {
    pub fn new(tasks: Vec<Task>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            tasks: tasks.into_iter().map(Arc::new).collect(),
            rng: Mutex::new(rng),
        }
    }

    /// Parse a corpus from a JSON string.
    ///
    /// Returns `JudgeError::TaskData` if the text is not a JSON array, a
    /// record is malformed, or two records share an id.
    pub fn from_json_str(s: &str, seed: Option<u64>) -> JudgeResult<Self> {
        let records: Vec<Value> = serde_json::from_str(s).map_err(|e| JudgeError::TaskData {
            reason: format!("task corpus is not a JSON array of records: {}", e),
        })?;

        let mut tasks = Vec::with_capacity(records.len());
        for record in records {
            let task = Task::from_record(record)?;
            if tasks.iter().any(|t: &Task| t.task_id == task.task_id) {
                return Err(JudgeError::TaskData {
                    reason: format!("duplicate task id '{}'", task.task_id),
                });
            }
            tasks.push(task);
        }

        info!(task_count = tasks.len(), "task corpus loaded");
        Ok(Self::new(tasks, seed))
    }

    /// Read and parse the corpus file at `path`.
    pub fn from_file(path: &Path, seed: Option<u64>) -> JudgeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| JudgeError::TaskData {
            reason: format!("failed to read task file '{}': {}", path.display(), e),
        })?;
        Self::from_json_str(&contents, seed)
    }

    /// The bundled sample corpus.
    pub fn sample_corpus(seed: Option<u64>) -> JudgeResult<Self> {
        Self::from_json_str(SAMPLE_TASKS, seed)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().map(|t| t.as_ref())
    }
}

impl TaskProvider for TaskPool {
    fn get(&self, task_id: &str) -> Option<Arc<Task>> {
        self.tasks.iter().find(|t| t.task_id == task_id).cloned()
    }

    fn sample(&self) -> Option<Arc<Task>> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.tasks.choose(&mut *rng).cloned()
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }
}
