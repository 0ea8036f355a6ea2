//! OTP issuance and verification endpoints.
//!
//! - `POST /send-otp`: email a 4-digit signup code
//! - `POST /verify-otp`: verify the code and create the doctor account
//! - `POST /send-phone-otp`: text a 6-digit login code
//! - `POST /verify-phone-otp`: verify the texted code
//!
//! Delivery is awaited here, unlike the post-commit confirmation messages:
//! an OTP the caller never received is useless, so a provider failure
//! surfaces as 502. The issued code stays stored either way, so a retried
//! send reuses the same window.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::doctor;
use crate::models::{Doctor, DoctorPublic};
use crate::{auth, db, ids, phone};

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Deserialize)]
pub struct SendEmailOtpRequest {
    pub email: String,
}

/// `POST /send-otp`: issue and email a signup code.
pub async fn send_email_otp(
    State(ctx): State<ApiContext>,
    Json(req): Json<SendEmailOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = normalize_email(&req.email)?;

    let code = lock_store(&ctx.email_otp)?.issue(&email);
    let body = format!(
        "Your Charak verification code is {code}. It expires in 5 minutes."
    );
    ctx.notifier
        .send_email(&email, "Charak verification code", &body)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "OTP email delivery failed");
            ApiError::Upstream("could not deliver the verification email".into())
        })?;

    tracing::info!(%email, "signup OTP sent");
    Ok(Json(MessageResponse {
        message: "OTP sent",
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailOtpRequest {
    pub email: String,
    pub otp: String,
    pub full_name: String,
    pub mbbs_cert_id: String,
    pub department: String,
    pub password: String,
    pub phone_number: Option<String>,
    pub phc_name: Option<String>,
}

/// `POST /verify-otp`: consume the code and create the doctor account.
pub async fn verify_email_otp(
    State(ctx): State<ApiContext>,
    Json(req): Json<VerifyEmailOtpRequest>,
) -> Result<(StatusCode, Json<DoctorPublic>), ApiError> {
    let email = normalize_email(&req.email)?;
    if req.full_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Full name is required".into()));
    }
    if req.mbbs_cert_id.trim().is_empty() {
        return Err(ApiError::BadRequest("MBBS certificate ID is required".into()));
    }
    if req.department.trim().is_empty() {
        return Err(ApiError::BadRequest("Department is required".into()));
    }
    if req.password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".into(),
        ));
    }

    if !lock_store(&ctx.email_otp)?.verify(&email, req.otp.trim()) {
        return Err(ApiError::BadRequest("Invalid or expired OTP".into()));
    }

    let doctor = Doctor {
        kg_id: ids::generate_doctor_id(),
        mbbs_cert_id: req.mbbs_cert_id.trim().to_string(),
        full_name: req.full_name.trim().to_string(),
        email,
        phone_number: req.phone_number,
        phc_name: req.phc_name,
        department: req.department.trim().to_string(),
        password_hash: auth::hash_password(&req.password),
        reset_token_hash: None,
        reset_token_expiry: None,
    };

    let conn = ctx.open_db()?;
    if let Err(err) = doctor::insert_doctor(&conn, &doctor) {
        return Err(match db::unique_violation(&err) {
            Some(msg) if msg.contains("email") => {
                ApiError::Conflict("a doctor with this email already exists".into())
            }
            Some(msg) if msg.contains("mbbs_cert_id") => {
                ApiError::Conflict("a doctor with this MBBS certificate ID already exists".into())
            }
            _ => err.into(),
        });
    }

    tracing::info!(kg_id = %doctor.kg_id, "doctor registered");
    Ok((StatusCode::CREATED, Json(DoctorPublic::from(&doctor))))
}

#[derive(Deserialize)]
pub struct SendPhoneOtpRequest {
    pub phone: String,
}

/// `POST /send-phone-otp`: issue and text a login code.
pub async fn send_phone_otp(
    State(ctx): State<ApiContext>,
    Json(req): Json<SendPhoneOtpRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let to = phone::normalize_e164(&req.phone, &ctx.config.default_calling_code)
        .ok_or_else(|| ApiError::InvalidContact("phone number is not a valid number".into()))?;

    let code = lock_store(&ctx.phone_otp)?.issue(&to);
    let body = format!("Your Charak verification code is {code}. It expires in 5 minutes.");
    ctx.notifier.send_sms(&to, &body).await.map_err(|e| {
        tracing::warn!(error = %e, "OTP SMS delivery failed");
        ApiError::Upstream("could not deliver the verification SMS".into())
    })?;

    tracing::info!(%to, "phone OTP sent");
    Ok(Json(MessageResponse {
        message: "OTP sent",
    }))
}

#[derive(Deserialize)]
pub struct VerifyPhoneOtpRequest {
    pub phone: String,
    pub otp: String,
}

#[derive(Serialize)]
pub struct VerifyPhoneOtpResponse {
    pub verified: bool,
}

/// `POST /verify-phone-otp`: consume the texted code.
pub async fn verify_phone_otp(
    State(ctx): State<ApiContext>,
    Json(req): Json<VerifyPhoneOtpRequest>,
) -> Result<Json<VerifyPhoneOtpResponse>, ApiError> {
    let to = phone::normalize_e164(&req.phone, &ctx.config.default_calling_code)
        .ok_or_else(|| ApiError::InvalidContact("phone number is not a valid number".into()))?;

    if !lock_store(&ctx.phone_otp)?.verify(&to, req.otp.trim()) {
        return Err(ApiError::BadRequest("Invalid or expired OTP".into()));
    }
    Ok(Json(VerifyPhoneOtpResponse { verified: true }))
}

fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    // Rough shape check; the delivery provider is the real validator.
    if email.is_empty() || !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(ApiError::BadRequest("A valid email is required".into()));
    }
    Ok(email)
}

fn lock_store<'a>(
    store: &'a std::sync::Arc<std::sync::Mutex<crate::otp::OtpStore>>,
) -> Result<std::sync::MutexGuard<'a, crate::otp::OtpStore>, ApiError> {
    store
        .lock()
        .map_err(|_| ApiError::Internal("OTP store lock poisoned".into()))
}
