//! HTTP route table.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//! Patient registration and doctor onboarding keep their legacy top-level
//! paths; everything else lives under `/api/`.

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the full API router with CORS from the configured allowlist.
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let cors = cors_layer(&ctx.config.allowed_origins);

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/opd",
            post(endpoints::opd::book).get(endpoints::opd::queue),
        )
        .route("/opd/slots", get(endpoints::opd::slots))
        .route(
            "/opd/:opd_number/status",
            patch(endpoints::opd::change_status),
        )
        .route(
            "/observations",
            post(endpoints::observations::record).get(endpoints::observations::history),
        )
        .route(
            "/doctor/reset-password",
            post(endpoints::doctors::reset_password),
        )
        .route(
            "/transcribe-medical",
            post(endpoints::transcribe::transcribe),
        );

    Router::new()
        .route("/register-patient", post(endpoints::patients::register))
        .route("/patient/:patient_id", get(endpoints::patients::get))
        .route("/send-otp", post(endpoints::otp::send_email_otp))
        .route("/verify-otp", post(endpoints::otp::verify_email_otp))
        .route("/send-phone-otp", post(endpoints::otp::send_phone_otp))
        .route("/verify-phone-otp", post(endpoints::otp::verify_phone_otp))
        .route("/doctor-login", post(endpoints::doctors::login))
        .route("/check-email", post(endpoints::doctors::check_email))
        .route(
            "/doctor-forgot-password",
            post(endpoints::doctors::forgot_password),
        )
        .nest("/api", api)
        .with_state(ctx)
        .layer(cors)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([CONTENT_TYPE])
}
