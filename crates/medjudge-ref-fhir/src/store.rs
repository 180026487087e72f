//! In-memory FHIR resource store backing the reference tools.
//!
//! The store is shared by every episode that uses the same executor, so
//! resources created through a write stay visible to later searches, the way
//! they would on a real server.

use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tracing::debug;

use crate::mock_data;

/// Maximum number of entries returned by one search.
pub const SEARCH_LIMIT: usize = 10;

/// First id handed out to a created resource.
const FIRST_CREATED_ID: u64 = 1001;

#[derive(Debug)]
struct StoreState {
    resources: Vec<Value>,
    created: Vec<Value>,
    next_id: u64,
}

/// A resource store pre-populated with the mock records.
#[derive(Debug)]
pub struct FhirStore {
    state: Mutex<StoreState>,
}

impl Default for FhirStore {
    fn default() -> Self {
        Self::seeded()
    }
}

impl FhirStore {
    /// A store holding `mock_data::seed_resources()`.
    pub fn seeded() -> Self {
        Self::with_resources(mock_data::seed_resources())
    }

    pub fn with_resources(resources: Vec<Value>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                resources,
                created: Vec::new(),
                next_id: FIRST_CREATED_ID,
            }),
        }
    }

    /// Read one resource by type and id.
    pub fn read(&self, resource_type: &str, id: &str) -> Option<Value> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .resources
            .iter()
            .find(|r| type_of(r) == Some(resource_type) && r.get("id").and_then(Value::as_str) == Some(id))
            .cloned()
    }

    /// Search resources of `resource_type` for the patient `subject_id`.
    ///
    /// Results are sorted newest first by the type's date field and capped
    /// at `SEARCH_LIMIT`. `filter` narrows the match further.
    pub fn search(&self, resource_type: &str, subject_id: &str, filter: impl Fn(&Value) -> bool) -> Vec<Value> {
        let reference = format!("Patient/{}", subject_id);
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let mut hits: Vec<Value> = state
            .resources
            .iter()
            .filter(|r| type_of(r) == Some(resource_type))
            .filter(|r| r.pointer("/subject/reference").and_then(Value::as_str) == Some(reference.as_str()))
            .filter(|r| filter(r))
            .cloned()
            .collect();

        hits.sort_by(|a, b| sort_date(b).cmp(&sort_date(a)));
        hits.truncate(SEARCH_LIMIT);
        debug!(resource_type, subject_id, hits = hits.len(), "store search");
        hits
    }

    /// Store `payload` as a new resource of `resource_type` and return its id.
    ///
    /// Errors mirror a server's `400` responses: the payload must be a JSON
    /// object whose `resourceType`, if present, equals `resource_type`.
    pub fn create(&self, resource_type: &str, payload: &Value) -> Result<String, String> {
        let Value::Object(fields) = payload else {
            return Err("payload must be a JSON object".to_string());
        };
        if let Some(declared) = fields.get("resourceType").and_then(Value::as_str) {
            if declared != resource_type {
                return Err(format!(
                    "resourceType '{}' does not match endpoint '{}'",
                    declared, resource_type
                ));
            }
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let id = state.next_id.to_string();
        state.next_id += 1;

        let mut resource = fields.clone();
        resource.insert("resourceType".to_string(), Value::String(resource_type.to_string()));
        resource.insert("id".to_string(), Value::String(id.clone()));
        let resource = Value::Object(resource);

        state.resources.push(resource.clone());
        state.created.push(resource);
        debug!(resource_type, id = %id, "resource created");
        Ok(id)
    }

    /// Resources created through `create`, oldest first.
    pub fn created(&self) -> Vec<Value> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).created.clone()
    }
}

fn type_of(resource: &Value) -> Option<&str> {
    resource.get("resourceType").and_then(Value::as_str)
}

/// The date a search sorts on, per resource type. Missing dates sort last.
fn sort_date(resource: &Value) -> &str {
    let pointers: &[&str] = match type_of(resource) {
        Some("Observation") => &["/effectiveDateTime", "/issued"],
        Some("Encounter") => &["/period/start"],
        Some("MedicationRequest") => &["/authoredOn"],
        Some("Procedure") => &["/performedDateTime", "/performedPeriod/start"],
        Some("DiagnosticReport") => &["/issued", "/effectiveDateTime"],
        Some("Condition") => &["/onsetDateTime", "/recordedDate"],
        _ => &[],
    };
    pointers
        .iter()
        .find_map(|p| resource.pointer(p).and_then(Value::as_str))
        .unwrap_or("")
}
