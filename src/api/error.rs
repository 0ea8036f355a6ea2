//! HTTP error surface.
//!
//! Every failure leaves the service as `{"error": {"code", "message"}}` with
//! a stable machine-readable code. Internal details are logged server-side
//! and never leak into the body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::booking::BookingError;
use crate::db::DatabaseError;

#[derive(Debug)]
pub enum ApiError {
    /// Malformed or incomplete request payload.
    BadRequest(String),
    /// Contact detail that cannot be normalized to E.164.
    InvalidContact(String),
    NotFound(String),
    Conflict(String),
    SlotTaken,
    DuplicatePhone,
    /// The visit is not in the lifecycle state the operation requires.
    InvalidTransition(String),
    BadCredentials(String),
    /// A delivery or transcription provider failed or is not configured.
    Upstream(String),
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::InvalidContact(_) => "INVALID_CONTACT",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::SlotTaken => "SLOT_TAKEN",
            ApiError::DuplicatePhone => "DUPLICATE_PHONE",
            ApiError::InvalidTransition(_) => "INVALID_TRANSITION",
            ApiError::BadCredentials(_) => "BAD_CREDENTIALS",
            ApiError::Upstream(_) => "UPSTREAM",
            ApiError::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InvalidContact(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_)
            | ApiError::SlotTaken
            | ApiError::DuplicatePhone
            | ApiError::InvalidTransition(_) => StatusCode::CONFLICT,
            ApiError::BadCredentials(_) => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(m)
            | ApiError::InvalidContact(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m)
            | ApiError::InvalidTransition(m)
            | ApiError::BadCredentials(m)
            | ApiError::Upstream(m) => m.clone(),
            ApiError::SlotTaken => {
                "this time slot is already booked for the selected department and date".into()
            }
            ApiError::DuplicatePhone => "a patient with this phone number already exists".into(),
            // Detail goes to the log, not the wire.
            ApiError::Internal(_) => "internal server error".into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(%detail, "request failed");
        }
        let body = json!({
            "error": {
                "code": self.code(),
                "message": self.message(),
            }
        });
        (self.status(), Json(body)).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} not found: {id}"))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        DatabaseError::from(err).into()
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::PatientNotFound(id) => {
                ApiError::NotFound(format!("patient not found: {id}"))
            }
            BookingError::EntryNotFound(n) => {
                ApiError::NotFound(format!("OPD entry not found: {n}"))
            }
            BookingError::InvalidContact => {
                ApiError::InvalidContact("patient phone number missing or invalid".into())
            }
            BookingError::SlotTaken => ApiError::SlotTaken,
            BookingError::OpdNumberExhausted => {
                ApiError::Conflict("could not allocate a unique OPD number, retry".into())
            }
            err @ BookingError::InvalidTransition { .. } => {
                ApiError::InvalidTransition(err.to_string())
            }
            err @ BookingError::NotAdmitted(_) => ApiError::InvalidTransition(err.to_string()),
            BookingError::Db(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_statuses() {
        let cases = [
            (ApiError::BadRequest("x".into()), 400, "BAD_REQUEST"),
            (ApiError::InvalidContact("x".into()), 400, "INVALID_CONTACT"),
            (ApiError::BadCredentials("x".into()), 401, "BAD_CREDENTIALS"),
            (ApiError::NotFound("x".into()), 404, "NOT_FOUND"),
            (ApiError::SlotTaken, 409, "SLOT_TAKEN"),
            (ApiError::DuplicatePhone, 409, "DUPLICATE_PHONE"),
            (ApiError::Upstream("x".into()), 502, "UPSTREAM"),
            (ApiError::Internal("x".into()), 500, "INTERNAL"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn internal_detail_stays_out_of_the_body() {
        let err = ApiError::Internal("secret table layout".into());
        assert_eq!(err.message(), "internal server error");
    }

    #[test]
    fn database_not_found_maps_to_404() {
        let err: ApiError = DatabaseError::NotFound {
            entity_type: "patient".into(),
            id: "pt-1".into(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn booking_errors_map_to_stable_codes() {
        assert_eq!(ApiError::from(BookingError::SlotTaken).code(), "SLOT_TAKEN");
        assert_eq!(
            ApiError::from(BookingError::InvalidContact).code(),
            "INVALID_CONTACT"
        );
        assert_eq!(
            ApiError::from(BookingError::PatientNotFound("pt-9".into())).code(),
            "NOT_FOUND"
        );
        assert_eq!(
            ApiError::from(BookingError::NotAdmitted(
                crate::models::OpdStatus::Waiting
            ))
            .code(),
            "INVALID_TRANSITION"
        );
    }
}
