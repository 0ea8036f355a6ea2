use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A doctor account. Secret material (`password_hash`, reset fields)
/// never leaves the crate; the API surface serializes [`DoctorPublic`].
#[derive(Debug, Clone)]
pub struct Doctor {
    pub kg_id: String,
    pub mbbs_cert_id: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub phc_name: Option<String>,
    pub department: String,
    pub password_hash: String,
    pub reset_token_hash: Option<String>,
    pub reset_token_expiry: Option<DateTime<Utc>>,
}

/// Client-facing projection of a doctor record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorPublic {
    pub kg_id: String,
    pub mbbs_cert_id: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub phc_name: Option<String>,
    pub department: String,
}

impl From<&Doctor> for DoctorPublic {
    fn from(d: &Doctor) -> Self {
        Self {
            kg_id: d.kg_id.clone(),
            mbbs_cert_id: d.mbbs_cert_id.clone(),
            full_name: d.full_name.clone(),
            email: d.email.clone(),
            phone_number: d.phone_number.clone(),
            phc_name: d.phc_name.clone(),
            department: d.department.clone(),
        }
    }
}
