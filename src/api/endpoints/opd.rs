//! OPD booking and queue endpoints.
//!
//! - `POST /api/opd`: book a slot for a registered patient
//! - `GET /api/opd`: waiting queue for the doctor dashboard
//! - `GET /api/opd/slots`: taken slots for the booking form
//! - `PATCH /api/opd/:opdNumber/status`: move a visit along its lifecycle

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::booking::{self, BookingRequest};
use crate::db::repository::opd;
use crate::models::{OpdEntry, OpdStatus, QueueEntry};
use crate::notify::dispatch_sms;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSlotRequest {
    pub patient_id: String,
    pub department: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    pub time_slot: String,
    pub phc_name: Option<String>,
}

/// `POST /api/opd`: book a slot. The unique slot index decides conflicts.
pub async fn book(
    State(ctx): State<ApiContext>,
    Json(req): Json<BookSlotRequest>,
) -> Result<(StatusCode, Json<OpdEntry>), ApiError> {
    if req.patient_id.trim().is_empty() {
        return Err(ApiError::BadRequest("Patient ID is required".into()));
    }
    if req.department.trim().is_empty() {
        return Err(ApiError::BadRequest("Department is required".into()));
    }
    if req.time_slot.trim().is_empty() {
        return Err(ApiError::BadRequest("Time slot is required".into()));
    }
    let date = NaiveDate::parse_from_str(req.date.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("Invalid date (expected YYYY-MM-DD)".into()))?;

    let request = BookingRequest {
        patient_id: req.patient_id,
        department: req.department.trim().to_string(),
        date,
        time_slot: req.time_slot.trim().to_string(),
        phc_name: req.phc_name,
    };

    let conn = ctx.open_db()?;
    let booked = booking::book_slot(&conn, &request, &ctx.config.default_calling_code)?;

    dispatch_sms(
        ctx.notifier.clone(),
        booked.patient_phone.clone(),
        booking::booking_confirmation_sms(&booked),
    );

    Ok((StatusCode::CREATED, Json(booked.entry)))
}

#[derive(Deserialize)]
pub struct QueueQuery {
    pub department: Option<String>,
}

/// `GET /api/opd`: waiting entries joined with patient display fields.
pub async fn queue(
    State(ctx): State<ApiContext>,
    Query(query): Query<QueueQuery>,
) -> Result<Json<Vec<QueueEntry>>, ApiError> {
    let conn = ctx.open_db()?;
    let entries = booking::queue_view(&conn, query.department.as_deref())?;
    Ok(Json(entries))
}

#[derive(Deserialize)]
pub struct SlotsQuery {
    pub department: Option<String>,
    pub date: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsResponse {
    pub taken_slots: Vec<String>,
}

/// `GET /api/opd/slots?department=&date=`: taken slots for one day.
///
/// A UX hint for the booking form only; the unique index remains the
/// authority on conflicts.
pub async fn slots(
    State(ctx): State<ApiContext>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, ApiError> {
    let department = query
        .department
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::BadRequest("department query parameter is required".into()))?;
    let date = query
        .date
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| ApiError::BadRequest("date query parameter is required".into()))?;
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest("Invalid date (expected YYYY-MM-DD)".into()))?;

    let conn = ctx.open_db()?;
    let taken_slots = opd::taken_slots(&conn, department, date)?;
    Ok(Json(SlotsResponse { taken_slots }))
}

#[derive(Deserialize)]
pub struct StatusChangeRequest {
    pub status: OpdStatus,
}

/// `PATCH /api/opd/:opdNumber/status`: lifecycle transition with validation.
pub async fn change_status(
    State(ctx): State<ApiContext>,
    Path(opd_number): Path<String>,
    Json(req): Json<StatusChangeRequest>,
) -> Result<Json<OpdEntry>, ApiError> {
    let conn = ctx.open_db()?;
    let entry = booking::change_status(&conn, opd_number.trim(), req.status)?;
    Ok(Json(entry))
}
