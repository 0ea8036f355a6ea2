//! `POST /api/transcribe-medical`: speech-to-text proxy.
//!
//! Forwards an uploaded audio clip to the configured transcription provider
//! with a clinical keyterm list, and returns the plain transcript. The
//! provider stays a black box; this endpoint only plumbs bytes and merges
//! keyterms.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

/// Keyterms always sent with a clip; callers can extend but not replace them.
const BASE_KEYTERMS: &[&str] = &[
    "paracetamol",
    "amoxicillin",
    "metformin",
    "amlodipine",
    "atorvastatin",
    "omeprazole",
    "azithromycin",
    "ibuprofen",
    "cetirizine",
    "hypertension",
    "diabetes",
    "tuberculosis",
    "dengue",
    "malaria",
    "anemia",
];

#[derive(Serialize)]
pub struct TranscribeResponse {
    pub transcript: String,
}

pub async fn transcribe(
    State(ctx): State<ApiContext>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let api_key = ctx
        .config
        .transcribe_api_key
        .as_deref()
        .ok_or_else(|| ApiError::Upstream("transcription provider is not configured".into()))?;

    let mut audio: Option<(Vec<u8>, String)> = None;
    let mut extra_keyterms: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("audio/webm")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("could not read audio: {e}")))?;
                audio = Some((bytes.to_vec(), content_type));
            }
            Some("keyterms") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("could not read keyterms: {e}")))?;
                extra_keyterms.extend(
                    text.split(',')
                        .map(|t| t.trim().to_string())
                        .filter(|t| !t.is_empty()),
                );
            }
            _ => {}
        }
    }

    let (bytes, content_type) =
        audio.ok_or_else(|| ApiError::BadRequest("audio field is required".into()))?;
    if bytes.is_empty() {
        return Err(ApiError::BadRequest("audio field is empty".into()));
    }

    let keyterms = merge_keyterms(&extra_keyterms);
    let mut query: Vec<(&str, String)> = vec![
        ("model", "nova-2-medical".to_string()),
        ("smart_format", "true".to_string()),
        ("language", "en".to_string()),
    ];
    for term in &keyterms {
        query.push(("keyterm", term.clone()));
    }

    let client = reqwest::Client::builder()
        .timeout(ctx.config.provider_timeout)
        .build()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let response = client
        .post(&ctx.config.transcribe_api_url)
        .query(&query)
        .header("Authorization", format!("Token {api_key}"))
        .header("Content-Type", content_type)
        .body(bytes)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "transcription request failed");
            ApiError::Upstream("transcription provider unreachable".into())
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let detail = response.text().await.unwrap_or_default();
        tracing::warn!(%status, %detail, "transcription provider error");
        return Err(ApiError::Upstream(format!(
            "transcription provider returned {status}"
        )));
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|e| ApiError::Upstream(format!("unparseable provider response: {e}")))?;
    let transcript = payload["results"]["channels"][0]["alternatives"][0]["transcript"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    Ok(Json(TranscribeResponse { transcript }))
}

/// Base clinical terms plus caller extras, case-insensitively deduplicated,
/// base terms first.
fn merge_keyterms(extra: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut merged: Vec<String> = Vec::new();
    for term in BASE_KEYTERMS.iter().map(|t| t.to_string()).chain(extra.iter().cloned()) {
        let folded = term.to_lowercase();
        if !seen.contains(&folded) {
            seen.push(folded);
            merged.push(term);
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_dedupes_case_insensitively() {
        let merged = merge_keyterms(&[
            "Paracetamol".to_string(),
            "insulin".to_string(),
            "INSULIN".to_string(),
        ]);
        let insulin_count = merged.iter().filter(|t| t.eq_ignore_ascii_case("insulin")).count();
        assert_eq!(insulin_count, 1);
        let para_count = merged
            .iter()
            .filter(|t| t.eq_ignore_ascii_case("paracetamol"))
            .count();
        assert_eq!(para_count, 1);
    }

    #[test]
    fn base_terms_come_first() {
        let merged = merge_keyterms(&["zincovit".to_string()]);
        assert_eq!(merged[0], BASE_KEYTERMS[0]);
        assert_eq!(merged.last().map(String::as_str), Some("zincovit"));
    }
}
