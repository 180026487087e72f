//! The reference tool executor.
//!
//! `MockFhirExecutor` exposes nine record-service capabilities and answers
//! each call with an English summary, never raw JSON. Every problem (missing
//! argument, unknown tool, unknown patient, rejected write) comes back as a
//! result string starting with `Error:` so the episode can carry on.

use serde_json::Value;
use tracing::{debug, info};

use medjudge_contracts::{
    action::ToolCall,
    capability::{CapabilitySpec, WRITE_CAPABILITY},
    task::UNKNOWN_SUBJECT,
};
use medjudge_core::traits::ToolExecutor;

use crate::store::FhirStore;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/fhir";

const UNKNOWN_PATIENT: &str = "Patient ID is unknown. Cannot query FHIR server.";

/// Tool executor over an in-memory `FhirStore`.
#[derive(Debug)]
pub struct MockFhirExecutor {
    base_url: String,
    store: FhirStore,
}

impl Default for MockFhirExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl MockFhirExecutor {
    /// An executor over the seeded mock records.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_store(base_url, FhirStore::seeded())
    }

    pub fn with_store(base_url: impl Into<String>, store: FhirStore) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
        }
    }

    pub fn store(&self) -> &FhirStore {
        &self.store
    }

    fn dispatch(&self, call: &ToolCall) -> String {
        let name = call.tool_name.as_str();

        if name == WRITE_CAPABILITY {
            let resource_type = text_arg(call, "resource_type");
            let payload = call.arguments.get("payload").filter(|p| is_present(p));
            return match (resource_type, payload) {
                (Some(rt), Some(payload)) => self.post_resource(&rt, payload),
                _ => format!(
                    "Error: Tool '{}' requires arguments 'resource_type' and 'payload'.",
                    WRITE_CAPABILITY
                ),
            };
        }

        if name == "get_recent_labs" {
            return match (text_arg(call, "patient_id"), text_arg(call, "lab_code")) {
                (Some(patient_id), Some(lab_code)) => self.recent_labs(&patient_id, &lab_code),
                _ => "Error: Tool 'get_recent_labs' requires arguments 'patient_id' and 'lab_code'.".to_string(),
            };
        }

        let summarize: fn(&Self, &str, &ToolCall) -> String = match name {
            "get_patient_basic" => |s, id, _| s.patient_basic(id),
            "get_conditions" => |s, id, _| s.conditions(id),
            "search_encounters" => |s, id, _| s.encounters(id),
            "search_medications" => |s, id, _| s.medications(id),
            "search_procedures" => |s, id, _| s.procedures(id),
            "search_observations" => |s, id, call| s.observations(id, text_arg(call, "category").as_deref()),
            "search_diagnostic_reports" => |s, id, _| s.diagnostic_reports(id),
            _ => {
                let available: Vec<String> = catalog().into_iter().map(|c| format!("'{}'", c.name)).collect();
                return format!("Error: Unknown tool '{}'. Available tools: [{}]", name, available.join(", "));
            }
        };

        match text_arg(call, "patient_id") {
            Some(patient_id) => summarize(self, &patient_id, call),
            None => format!("Error: Tool '{}' requires argument 'patient_id'.", name),
        }
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    fn patient_basic(&self, patient_id: &str) -> String {
        if patient_id == UNKNOWN_SUBJECT {
            return "Patient ID is unknown. Cannot query FHIR server. This typically means the patient does not exist in the system.".to_string();
        }
        let Some(patient) = self.store.read("Patient", patient_id) else {
            return format!(
                "Error: Failed to retrieve patient information. Status=404, Response=Resource Patient/{} is not known",
                patient_id
            );
        };

        let name = patient
            .pointer("/name/0")
            .map(|n| {
                let given: Vec<&str> = n
                    .get("given")
                    .and_then(Value::as_array)
                    .map(|g| g.iter().filter_map(Value::as_str).collect())
                    .unwrap_or_default();
                let family = n.get("family").and_then(Value::as_str).unwrap_or("");
                format!("{} {}", given.join(" "), family).trim().to_string()
            })
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        format!(
            "Patient Basic Information:\n- ID (MRN): {}\n- Name: {}\n- Gender: {}\n- Birth Date: {}",
            patient_id,
            name,
            str_field(&patient, "/gender").unwrap_or("unknown"),
            str_field(&patient, "/birthDate").unwrap_or("unknown"),
        )
    }

    fn recent_labs(&self, patient_id: &str, lab_code: &str) -> String {
        if patient_id == UNKNOWN_SUBJECT {
            return UNKNOWN_PATIENT.to_string();
        }
        let entries = self.store.search("Observation", patient_id, |r| has_code(r, lab_code));
        if entries.is_empty() {
            return format!("No lab results found for patient {} with code {}.", patient_id, lab_code);
        }

        let mut lines = vec![format!("Recent lab results for patient {} (code: {}):", patient_id, lab_code)];
        for res in &entries {
            let when = effective_time(res);
            match quantity_or_string(res) {
                Some(value) => lines.push(format!("  - {}: {}", when, value)),
                None => lines.push(format!("  - {}: (no structured value available)", when)),
            }
        }
        lines.join("\n")
    }

    fn conditions(&self, patient_id: &str) -> String {
        if patient_id == UNKNOWN_SUBJECT {
            return UNKNOWN_PATIENT.to_string();
        }
        let entries = self.store.search("Condition", patient_id, |_| true);
        if entries.is_empty() {
            return format!("No conditions found for patient {}.", patient_id);
        }

        let mut lines = vec![format!("Medical conditions for patient {}:", patient_id)];
        for res in &entries {
            let onset = str_field(res, "/onsetDateTime")
                .or_else(|| str_field(res, "/recordedDate"))
                .unwrap_or("unknown date");
            lines.push(format!(
                "  - {} (onset/recorded: {})",
                concept_name(res.get("code")).unwrap_or("unknown diagnosis"),
                onset
            ));
        }
        lines.join("\n")
    }

    fn encounters(&self, patient_id: &str) -> String {
        if patient_id == UNKNOWN_SUBJECT {
            return UNKNOWN_PATIENT.to_string();
        }
        let entries = self.store.search("Encounter", patient_id, |_| true);
        if entries.is_empty() {
            return format!("No encounters found for patient {}.", patient_id);
        }

        let mut lines = vec![format!("Encounters for patient {}:", patient_id)];
        for res in &entries {
            lines.push(format!(
                "  - {} | Period: {} to {} | Status: {}",
                concept_name(res.pointer("/type/0")).unwrap_or("unknown type"),
                str_field(res, "/period/start").unwrap_or("unknown"),
                str_field(res, "/period/end").unwrap_or("ongoing"),
                str_field(res, "/status").unwrap_or("unknown"),
            ));
        }
        lines.join("\n")
    }

    fn medications(&self, patient_id: &str) -> String {
        if patient_id == UNKNOWN_SUBJECT {
            return UNKNOWN_PATIENT.to_string();
        }
        let entries = self.store.search("MedicationRequest", patient_id, |_| true);
        if entries.is_empty() {
            return format!("No medication requests found for patient {}.", patient_id);
        }

        let mut lines = vec![format!("Medications for patient {}:", patient_id)];
        for res in &entries {
            lines.push(format!(
                "  - {} | Status: {} | Authored: {}",
                concept_name(res.get("medicationCodeableConcept")).unwrap_or("unknown medication"),
                str_field(res, "/status").unwrap_or("unknown"),
                str_field(res, "/authoredOn").unwrap_or("unknown date"),
            ));
        }
        lines.join("\n")
    }

    fn procedures(&self, patient_id: &str) -> String {
        if patient_id == UNKNOWN_SUBJECT {
            return UNKNOWN_PATIENT.to_string();
        }
        let entries = self.store.search("Procedure", patient_id, |_| true);
        if entries.is_empty() {
            return format!("No procedures found for patient {}.", patient_id);
        }

        let mut lines = vec![format!("Procedures for patient {}:", patient_id)];
        for res in &entries {
            let performed = str_field(res, "/performedDateTime")
                .or_else(|| str_field(res, "/performedPeriod/start"))
                .unwrap_or("unknown date");
            lines.push(format!(
                "  - {} | Performed: {} | Status: {}",
                concept_name(res.get("code")).unwrap_or("unknown procedure"),
                performed,
                str_field(res, "/status").unwrap_or("unknown"),
            ));
        }
        lines.join("\n")
    }

    fn observations(&self, patient_id: &str, category: Option<&str>) -> String {
        if patient_id == UNKNOWN_SUBJECT {
            return UNKNOWN_PATIENT.to_string();
        }
        let suffix = category.map(|c| format!(" (category: {})", c)).unwrap_or_default();
        let entries = self.store.search("Observation", patient_id, |r| match category {
            Some(c) => has_category(r, c),
            None => true,
        });
        if entries.is_empty() {
            return format!("No observations found for patient {}{}.", patient_id, suffix);
        }

        let mut lines = vec![format!("Observations for patient {}{}:", patient_id, suffix)];
        for res in &entries {
            let name = concept_name(res.get("code")).unwrap_or("unknown observation");
            let value = quantity_or_string(res)
                .or_else(|| concept_name(res.get("valueCodeableConcept")).map(str::to_string));
            let when = effective_time(res);
            match value {
                Some(value) => lines.push(format!("  - {}: {} | Time: {}", name, value, when)),
                None => lines.push(format!("  - {}: (no value available) | Time: {}", name, when)),
            }
        }
        lines.join("\n")
    }

    fn diagnostic_reports(&self, patient_id: &str) -> String {
        if patient_id == UNKNOWN_SUBJECT {
            return UNKNOWN_PATIENT.to_string();
        }
        let entries = self.store.search("DiagnosticReport", patient_id, |_| true);
        if entries.is_empty() {
            return format!("No diagnostic reports found for patient {}.", patient_id);
        }

        let mut lines = vec![format!("Diagnostic reports for patient {}:", patient_id)];
        for res in &entries {
            let issued = str_field(res, "/issued")
                .or_else(|| str_field(res, "/effectiveDateTime"))
                .unwrap_or("unknown date");
            lines.push(format!(
                "  - {} | Status: {} | Issued: {}",
                concept_name(res.get("code")).unwrap_or("unknown report"),
                str_field(res, "/status").unwrap_or("unknown"),
                issued,
            ));
            lines.push(format!(
                "    Conclusion: {}",
                str_field(res, "/conclusion").unwrap_or("no conclusion available")
            ));
        }
        lines.join("\n")
    }

    // ── Writes ───────────────────────────────────────────────────────────────

    fn post_resource(&self, resource_type: &str, payload: &Value) -> String {
        match self.store.create(resource_type, payload) {
            Ok(id) => {
                info!(resource_type, id = %id, "resource created through write capability");
                format!("Success: Created {} with ID {}. Status code: 201", resource_type, id)
            }
            Err(reason) => format!(
                "Error: Failed to create {}. Status=400, Response={}",
                resource_type, reason
            ),
        }
    }
}

impl ToolExecutor for MockFhirExecutor {
    fn catalog(&self) -> Vec<CapabilitySpec> {
        catalog()
    }

    fn invoke(&self, call: &ToolCall) -> String {
        debug!(tool = %call.tool_name, base_url = %self.base_url, "mock FHIR call");
        self.dispatch(call)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// The fixed capability menu, in presentation order.
pub fn catalog() -> Vec<CapabilitySpec> {
    vec![
        CapabilitySpec::new(
            "get_patient_basic",
            "Retrieve basic patient information including name, gender, and birth date.",
        ),
        CapabilitySpec::new(
            "get_recent_labs",
            "Retrieve recent laboratory results for a specific lab code (e.g., Hb, Cr, GLU, MG).",
        ),
        CapabilitySpec::new(
            "get_conditions",
            "Retrieve current and past medical diagnoses (conditions) for the patient.",
        ),
        CapabilitySpec::new(
            "search_encounters",
            "Search hospital visits and outpatient encounters for the patient.",
        ),
        CapabilitySpec::new(
            "search_medications",
            "Search current and past medications for the patient.",
        ),
        CapabilitySpec::new(
            "search_procedures",
            "Search medical procedures performed for the patient.",
        ),
        CapabilitySpec::new(
            "search_observations",
            "Search observations for the patient, optionally filtered by category (e.g., vital-signs, laboratory).",
        ),
        CapabilitySpec::new(
            "search_diagnostic_reports",
            "Search diagnostic reports including imaging studies and test results.",
        ),
        CapabilitySpec::new(
            WRITE_CAPABILITY,
            "Create a new FHIR resource by POSTing to the FHIR server. Use this to create Observations, \
             MedicationRequests, ServiceRequests, etc. Requires resource_type (e.g., 'Observation') and \
             payload (complete FHIR resource as dict).",
        ),
    ]
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// A non-empty string argument, or a number rendered as text.
fn text_arg(call: &ToolCall, key: &str) -> Option<String> {
    match call.arguments.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(m) => !m.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn str_field<'a>(resource: &'a Value, pointer: &str) -> Option<&'a str> {
    resource.pointer(pointer).and_then(Value::as_str)
}

/// `text`, else the first coding's `display`, else its `code`.
fn concept_name(concept: Option<&Value>) -> Option<&str> {
    let concept = concept?;
    str_field(concept, "/text")
        .or_else(|| str_field(concept, "/coding/0/display"))
        .or_else(|| str_field(concept, "/coding/0/code"))
}

fn has_code(resource: &Value, code: &str) -> bool {
    let eq_code = |v: Option<&str>| v.is_some_and(|s| s.eq_ignore_ascii_case(code));
    let codings = resource
        .pointer("/code/coding")
        .and_then(Value::as_array)
        .map(|c| c.iter().any(|coding| eq_code(coding.get("code").and_then(Value::as_str))))
        .unwrap_or(false);
    codings || eq_code(str_field(resource, "/code/text"))
}

fn has_category(resource: &Value, category: &str) -> bool {
    resource
        .get("category")
        .and_then(Value::as_array)
        .is_some_and(|cats| {
            cats.iter().any(|c| {
                c.pointer("/coding/0/code").and_then(Value::as_str) == Some(category)
                    || c.get("text").and_then(Value::as_str) == Some(category)
            })
        })
}

fn effective_time(resource: &Value) -> &str {
    str_field(resource, "/effectiveDateTime")
        .or_else(|| str_field(resource, "/issued"))
        .unwrap_or("unknown time")
}

/// `valueQuantity` as "value unit", or `valueString`.
fn quantity_or_string(resource: &Value) -> Option<String> {
    if let Some(quantity) = resource.get("valueQuantity") {
        let value = quantity.get("value")?;
        let unit = quantity.get("unit").and_then(Value::as_str).unwrap_or("");
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Some(format!("{} {}", value, unit).trim().to_string());
    }
    str_field(resource, "/valueString").map(str::to_string)
}
