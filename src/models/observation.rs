use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: Uuid,
    pub opd_number: String,
    pub doctor_id: String,
    pub patient_id: String,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub advice: Option<String>,
    pub prescription: Vec<PrescriptionLine>,
    pub recorded_at: DateTime<Utc>,
}

/// One medication line of an observation's prescription.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionLine {
    pub drug_name: String,
    pub dosage: Option<String>,
    pub duration: Option<String>,
}
