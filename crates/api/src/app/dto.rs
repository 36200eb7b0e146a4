use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderMap, HeaderName, HeaderValue, header};
use serde::Serialize;

use crate::app::errors::ApiError;

/// Response header naming the id of a deleted record.
pub const ENTITY_HEADER: HeaderName = HeaderName::from_static("entity");

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn bearer(token: String, expires_in: i64) -> Self {
        Self {
            token,
            token_type: "Bearer",
            expires_in,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub identity: reading_core::Identity,
}

// -------------------------
// Extraction helpers
// -------------------------

/// Unwrap a JSON body, turning any rejection (bad JSON, wrong content type,
/// wrong field types) into a 422.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::Unprocessable(rejection.body_text()))
}

/// Parse a numeric path segment; anything else is a 400.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: core::str::FromStr<Err = reading_core::DomainError>,
{
    raw.parse::<T>().map_err(ApiError::from)
}

pub fn location(path: String) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&path) {
        headers.insert(header::LOCATION, value);
    }
    headers
}

pub fn entity(id: impl core::fmt::Display) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        headers.insert(ENTITY_HEADER, value);
    }
    headers
}
