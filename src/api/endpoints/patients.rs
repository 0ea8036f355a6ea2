//! Patient registry endpoints.
//!
//! - `POST /register-patient`: register a patient, SMS the new ID
//! - `GET /patient/:patientId`: fetch one patient record

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::patient;
use crate::models::Patient;
use crate::notify::dispatch_sms;
use crate::phone;
use crate::{db, ids};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPatientRequest {
    pub full_name: String,
    /// `YYYY-MM-DD`.
    pub date_of_birth: String,
    pub phone_number: String,
    pub sex: String,
    pub father_mother_name: Option<String>,
    pub husband_wife_name: Option<String>,
    pub pan_card: Option<String>,
    pub aadhar_card: Option<String>,
    pub ration_card: Option<String>,
    pub address: Option<String>,
    pub photo: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPatientResponse {
    pub patient_id: String,
}

/// `POST /register-patient`: create a patient and text them their ID.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(req): Json<RegisterPatientRequest>,
) -> Result<(StatusCode, Json<RegisterPatientResponse>), ApiError> {
    if req.full_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Full name is required".into()));
    }
    if req.sex.trim().is_empty() {
        return Err(ApiError::BadRequest("Sex is required".into()));
    }
    let date_of_birth = NaiveDate::parse_from_str(req.date_of_birth.trim(), "%Y-%m-%d")
        .map_err(|_| {
            ApiError::BadRequest("Invalid date of birth (expected YYYY-MM-DD)".into())
        })?;
    let phone_number = req.phone_number.trim().to_string();
    if phone_number.is_empty() {
        return Err(ApiError::BadRequest("Phone number is required".into()));
    }

    let patient = Patient {
        patient_id: ids::generate_patient_id(),
        full_name: req.full_name.trim().to_string(),
        date_of_birth,
        phone_number,
        sex: req.sex.trim().to_string(),
        father_mother_name: req.father_mother_name,
        husband_wife_name: req.husband_wife_name,
        pan_card: req.pan_card,
        aadhar_card: req.aadhar_card,
        ration_card: req.ration_card,
        address: req.address,
        photo: req.photo,
        registered_at: Utc::now(),
    };

    let conn = ctx.open_db()?;
    if let Err(err) = patient::insert_patient(&conn, &patient) {
        return Err(match db::unique_violation(&err) {
            Some(msg) if msg.contains("phone_number") => ApiError::DuplicatePhone,
            _ => err.into(),
        });
    }

    tracing::info!(patient_id = %patient.patient_id, "patient registered");

    // Best-effort welcome SMS; delivery never gates registration.
    if let Some(to) =
        phone::normalize_e164(&patient.phone_number, &ctx.config.default_calling_code)
    {
        let body = format!(
            "Welcome to Charak! Your Patient ID is {}. Keep it safe, you will need it to book OPD appointments.",
            patient.patient_id
        );
        dispatch_sms(ctx.notifier.clone(), to, body);
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterPatientResponse {
            patient_id: patient.patient_id,
        }),
    ))
}

/// `GET /patient/:patientId`: fetch a patient record.
pub async fn get(
    State(ctx): State<ApiContext>,
    Path(patient_id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let normalized = patient_id.trim().to_lowercase();
    let conn = ctx.open_db()?;
    let patient = patient::get_patient(&conn, &normalized)?
        .ok_or_else(|| ApiError::NotFound(format!("patient not found: {normalized}")))?;
    Ok(Json(patient))
}
