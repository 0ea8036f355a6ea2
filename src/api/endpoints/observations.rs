//! Clinical observation endpoints.
//!
//! - `POST /api/observations`: record a note against an admitted visit
//! - `GET /api/observations?patientId=`: per-patient history, newest first

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::booking::{self, ObservationInput};
use crate::db::repository::observation;
use crate::models::{Observation, PrescriptionLine};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordObservationRequest {
    pub opd_number: String,
    pub doctor_id: String,
    pub patient_id: String,
    pub symptoms: Option<String>,
    pub diagnosis: Option<String>,
    pub advice: Option<String>,
    #[serde(default)]
    pub prescription: Vec<PrescriptionLine>,
}

/// `POST /api/observations`: the visit must exist and be admitted.
pub async fn record(
    State(ctx): State<ApiContext>,
    Json(req): Json<RecordObservationRequest>,
) -> Result<(StatusCode, Json<Observation>), ApiError> {
    if req.opd_number.trim().is_empty() {
        return Err(ApiError::BadRequest("OPD number is required".into()));
    }
    if req.doctor_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Doctor ID is required".into()));
    }
    if req.patient_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Patient ID is required".into()));
    }

    let mut conn = ctx.open_db()?;
    let recorded = booking::record_observation(
        &mut conn,
        ObservationInput {
            opd_number: req.opd_number.trim().to_string(),
            doctor_id: req.doctor_id.trim().to_string(),
            patient_id: req.patient_id.trim().to_lowercase(),
            symptoms: req.symptoms,
            diagnosis: req.diagnosis,
            advice: req.advice,
            prescription: req.prescription,
        },
    )?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub patient_id: Option<String>,
}

/// `GET /api/observations?patientId=`: history, newest first.
pub async fn history(
    State(ctx): State<ApiContext>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<Observation>>, ApiError> {
    let patient_id = query
        .patient_id
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::BadRequest("patientId query parameter is required".into()))?
        .to_lowercase();

    let conn = ctx.open_db()?;
    let records = observation::observations_for_patient(&conn, &patient_id)?;
    Ok(Json(records))
}
