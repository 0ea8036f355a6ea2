use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub patient_id: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub phone_number: String,
    pub sex: String,
    pub father_mother_name: Option<String>,
    pub husband_wife_name: Option<String>,
    pub pan_card: Option<String>,
    pub aadhar_card: Option<String>,
    pub ration_card: Option<String>,
    pub address: Option<String>,
    /// Base64 string or URL, passed through untouched.
    pub photo: Option<String>,
    pub registered_at: DateTime<Utc>,
}
