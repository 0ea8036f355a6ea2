use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::OpdStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpdEntry {
    pub opd_number: String,
    pub patient_id: String,
    pub department: String,
    pub date: NaiveDate,
    pub time_slot: String,
    pub status: OpdStatus,
    pub phc_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Queue-view row: an OPD entry joined with patient display fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    #[serde(flatten)]
    pub entry: OpdEntry,
    pub patient_name: String,
    pub patient_phone: String,
    pub sex: String,
    pub address: Option<String>,
}
