//! Simulated clinical records for the medjudge reference record service.
//!
//! All data in this module is hardcoded and fictional. No external systems are
//! contacted. The resources follow the FHIR R4 shapes closely enough for the
//! tool summaries to read like a real server's, and stand in for a live FHIR
//! endpoint during local runs and tests.
//!
//! Patients:
//! - S1234567  Maria Alvarez     female  1962-04-15
//! - S7654321  David Chen        male    1985-09-30
//! - S2345678  Priya Natarajan   female  1990-01-22
//!
//! The reference "now" for the bundled tasks is 2023-11-13T10:15:00+00:00.

use serde_json::{json, Value};

/// Every seeded resource, in no particular order.
pub fn seed_resources() -> Vec<Value> {
    let mut resources = patients();
    resources.extend(labs());
    resources.extend(vitals());
    resources.extend(conditions());
    resources.extend(encounters());
    resources.extend(medications());
    resources.extend(procedures());
    resources.extend(diagnostic_reports());
    resources
}

// ── Patients (mock) ──────────────────────────────────────────────────────────

fn patients() -> Vec<Value> {
    vec![
        patient("S1234567", "Maria", "Alvarez", "female", "1962-04-15"),
        patient("S7654321", "David", "Chen", "male", "1985-09-30"),
        patient("S2345678", "Priya", "Natarajan", "female", "1990-01-22"),
    ]
}

fn patient(mrn: &str, given: &str, family: &str, gender: &str, birth_date: &str) -> Value {
    json!({
        "resourceType": "Patient",
        "id": mrn,
        "identifier": [{ "system": "http://hospital.example/mrn", "value": mrn }],
        "name": [{ "use": "official", "given": [given], "family": family }],
        "gender": gender,
        "birthDate": birth_date
    })
}

// ── Laboratory results (mock) ────────────────────────────────────────────────

/// Magnesium, hemoglobin, creatinine and glucose results.
///
/// S2345678 has a normal magnesium within 24 hours of the reference time;
/// S7654321 has a low one; S1234567 has none recent.
fn labs() -> Vec<Value> {
    vec![
        lab("lab-001", "S2345678", "MG", "Magnesium", 1.8, "mg/dL", "2023-11-13T02:30:00+00:00"),
        lab("lab-002", "S2345678", "MG", "Magnesium", 2.1, "mg/dL", "2023-11-10T08:00:00+00:00"),
        lab("lab-003", "S7654321", "MG", "Magnesium", 1.3, "mg/dL", "2023-11-13T06:00:00+00:00"),
        lab("lab-004", "S1234567", "MG", "Magnesium", 2.0, "mg/dL", "2023-10-02T09:45:00+00:00"),
        lab("lab-005", "S1234567", "HB", "Hemoglobin", 12.9, "g/dL", "2023-11-12T07:20:00+00:00"),
        lab("lab-006", "S1234567", "CR", "Creatinine", 0.9, "mg/dL", "2023-11-12T07:20:00+00:00"),
        lab("lab-007", "S7654321", "GLU", "Glucose", 142.0, "mg/dL", "2023-11-12T21:05:00+00:00"),
    ]
}

fn lab(id: &str, mrn: &str, code: &str, display: &str, value: f64, unit: &str, when: &str) -> Value {
    json!({
        "resourceType": "Observation",
        "id": id,
        "status": "final",
        "category": [{ "coding": [{ "code": "laboratory" }] }],
        "code": { "coding": [{ "system": "http://hospital.example/lab", "code": code, "display": display }] },
        "subject": { "reference": format!("Patient/{}", mrn) },
        "effectiveDateTime": when,
        "valueQuantity": { "value": value, "unit": unit }
    })
}

// ── Vital signs (mock) ───────────────────────────────────────────────────────

fn vitals() -> Vec<Value> {
    vec![
        json!({
            "resourceType": "Observation",
            "id": "vs-001",
            "status": "final",
            "category": [{ "coding": [{ "code": "vital-signs" }] }],
            "code": { "text": "Blood pressure" },
            "subject": { "reference": "Patient/S1234567" },
            "effectiveDateTime": "2023-11-01T14:00:00+00:00",
            "valueString": "124/81 mmHg"
        }),
        json!({
            "resourceType": "Observation",
            "id": "vs-002",
            "status": "final",
            "category": [{ "coding": [{ "code": "vital-signs" }] }],
            "code": { "coding": [{ "code": "8867-4", "display": "Heart rate" }] },
            "subject": { "reference": "Patient/S7654321" },
            "effectiveDateTime": "2023-11-12T21:00:00+00:00",
            "valueQuantity": { "value": 88, "unit": "/min" }
        }),
        json!({
            "resourceType": "Observation",
            "id": "sh-001",
            "status": "final",
            "category": [{ "coding": [{ "code": "social-history" }] }],
            "code": { "text": "Tobacco smoking status" },
            "subject": { "reference": "Patient/S7654321" },
            "effectiveDateTime": "2023-06-20T10:00:00+00:00",
            "valueCodeableConcept": { "coding": [{ "display": "Never smoker" }] }
        }),
    ]
}

// ── Conditions (mock) ────────────────────────────────────────────────────────

fn conditions() -> Vec<Value> {
    vec![
        json!({
            "resourceType": "Condition",
            "id": "cond-001",
            "subject": { "reference": "Patient/S1234567" },
            "code": { "text": "Essential hypertension" },
            "onsetDateTime": "2015-03-10"
        }),
        json!({
            "resourceType": "Condition",
            "id": "cond-002",
            "subject": { "reference": "Patient/S1234567" },
            "code": { "coding": [{ "code": "E11.9", "display": "Type 2 diabetes mellitus without complications" }] },
            "recordedDate": "2018-07-22"
        }),
        json!({
            "resourceType": "Condition",
            "id": "cond-003",
            "subject": { "reference": "Patient/S7654321" },
            "code": { "coding": [{ "code": "K21.9" }] }
        }),
    ]
}

// ── Encounters (mock) ────────────────────────────────────────────────────────

fn encounters() -> Vec<Value> {
    vec![
        json!({
            "resourceType": "Encounter",
            "id": "enc-001",
            "status": "finished",
            "type": [{ "coding": [{ "code": "AMB", "display": "Outpatient visit" }] }],
            "subject": { "reference": "Patient/S1234567" },
            "period": { "start": "2023-11-01T13:30:00+00:00", "end": "2023-11-01T14:30:00+00:00" }
        }),
        json!({
            "resourceType": "Encounter",
            "id": "enc-002",
            "status": "in-progress",
            "type": [{ "text": "Inpatient admission" }],
            "subject": { "reference": "Patient/S7654321" },
            "period": { "start": "2023-11-12T18:40:00+00:00" }
        }),
    ]
}

// ── Medications (mock) ───────────────────────────────────────────────────────

fn medications() -> Vec<Value> {
    vec![
        json!({
            "resourceType": "MedicationRequest",
            "id": "med-001",
            "status": "active",
            "intent": "order",
            "medicationCodeableConcept": { "text": "lisinopril 10 mg oral tablet" },
            "subject": { "reference": "Patient/S1234567" },
            "authoredOn": "2023-01-15T09:00:00+00:00"
        }),
        json!({
            "resourceType": "MedicationRequest",
            "id": "med-002",
            "status": "active",
            "intent": "order",
            "medicationCodeableConcept": {
                "coding": [{ "code": "860975", "display": "metformin 500 mg oral tablet" }]
            },
            "subject": { "reference": "Patient/S1234567" },
            "authoredOn": "2019-02-03T11:30:00+00:00"
        }),
    ]
}

// ── Procedures (mock) ────────────────────────────────────────────────────────

fn procedures() -> Vec<Value> {
    vec![
        json!({
            "resourceType": "Procedure",
            "id": "proc-001",
            "status": "completed",
            "code": { "text": "Colonoscopy" },
            "subject": { "reference": "Patient/S1234567" },
            "performedDateTime": "2022-05-18T08:00:00+00:00"
        }),
        json!({
            "resourceType": "Procedure",
            "id": "proc-002",
            "status": "completed",
            "code": { "coding": [{ "code": "36415", "display": "Venipuncture" }] },
            "subject": { "reference": "Patient/S7654321" },
            "performedPeriod": { "start": "2023-11-13T05:55:00+00:00", "end": "2023-11-13T06:00:00+00:00" }
        }),
    ]
}

// ── Diagnostic reports (mock) ────────────────────────────────────────────────

fn diagnostic_reports() -> Vec<Value> {
    vec![json!({
        "resourceType": "DiagnosticReport",
        "id": "dr-001",
        "status": "final",
        "code": { "text": "Chest X-ray, 2 views" },
        "subject": { "reference": "Patient/S7654321" },
        "issued": "2023-11-12T19:30:00+00:00",
        "conclusion": "No acute cardiopulmonary process."
    })]
}
