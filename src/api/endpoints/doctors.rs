//! Doctor account endpoints.
//!
//! - `POST /doctor-login`: credential check
//! - `POST /check-email`: signup form helper
//! - `POST /doctor-forgot-password`: issue a reset token
//! - `POST /api/doctor/reset-password`: redeem a reset token
//!
//! Reset tokens are stored hashed with a one hour expiry; the raw token
//! exists only in the email. Redemption looks the presented token up by its
//! hash, so a database read never reveals a usable token.

use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth;
use crate::db::repository::doctor;
use crate::models::DoctorPublic;

const RESET_TOKEN_VALIDITY_HOURS: i64 = 1;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub mbbs_cert_id: String,
    pub password: String,
}

/// `POST /doctor-login`: 404 for an unknown ID, 401 for a bad password.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<DoctorPublic>, ApiError> {
    let cert_id = req.mbbs_cert_id.trim();
    if cert_id.is_empty() {
        return Err(ApiError::BadRequest("MBBS certificate ID is required".into()));
    }

    let conn = ctx.open_db()?;
    let doctor = doctor::get_doctor_by_cert_id(&conn, cert_id)?
        .ok_or_else(|| ApiError::NotFound(format!("doctor not found: {cert_id}")))?;

    if !auth::verify_password(&req.password, &doctor.password_hash) {
        return Err(ApiError::BadCredentials("incorrect password".into()));
    }

    tracing::info!(kg_id = %doctor.kg_id, "doctor logged in");
    Ok(Json(DoctorPublic::from(&doctor)))
}

#[derive(Deserialize)]
pub struct CheckEmailRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct CheckEmailResponse {
    pub exists: bool,
}

/// `POST /check-email`: whether a doctor account uses this email.
pub async fn check_email(
    State(ctx): State<ApiContext>,
    Json(req): Json<CheckEmailRequest>,
) -> Result<Json<CheckEmailResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".into()));
    }
    let conn = ctx.open_db()?;
    let exists = doctor::get_doctor_by_email(&conn, &email)?.is_some();
    Ok(Json(CheckEmailResponse { exists }))
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// `POST /doctor-forgot-password`: store a hashed reset token, email the raw one.
pub async fn forgot_password(
    State(ctx): State<ApiContext>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::BadRequest("Email is required".into()));
    }

    let conn = ctx.open_db()?;
    let doctor = doctor::get_doctor_by_email(&conn, &email)?
        .ok_or_else(|| ApiError::NotFound(format!("no doctor account for {email}")))?;

    let token = auth::generate_reset_token();
    let expiry = Utc::now() + Duration::hours(RESET_TOKEN_VALIDITY_HOURS);
    doctor::set_reset_token(&conn, &doctor.kg_id, &auth::hash_token(&token), expiry)?;

    let body = format!(
        "Hello Dr. {},\n\nUse this code to reset your Charak password:\n\n{token}\n\nThe code expires in one hour. If you did not request a reset, ignore this email.",
        doctor.full_name
    );
    ctx.notifier
        .send_email(&email, "Charak password reset", &body)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "reset email delivery failed");
            ApiError::Upstream("could not deliver the reset email".into())
        })?;

    tracing::info!(kg_id = %doctor.kg_id, "password reset token issued");
    Ok(Json(MessageResponse {
        message: "Reset email sent",
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// `POST /api/doctor/reset-password`: redeem an unexpired reset token.
pub async fn reset_password(
    State(ctx): State<ApiContext>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let token = req.token.trim();
    if token.is_empty() {
        return Err(ApiError::BadRequest("Reset token is required".into()));
    }
    if req.new_password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    let conn = ctx.open_db()?;
    let doctor =
        doctor::get_doctor_by_reset_token_hash(&conn, &auth::hash_token(token), Utc::now())?
            .ok_or_else(|| ApiError::BadRequest("Invalid or expired reset token".into()))?;

    // Setting the password also clears the reset fields, so the token is
    // single-use.
    doctor::update_password(&conn, &doctor.kg_id, &auth::hash_password(&req.new_password))?;

    tracing::info!(kg_id = %doctor.kg_id, "password reset completed");
    Ok(Json(MessageResponse {
        message: "Password updated",
    }))
}
