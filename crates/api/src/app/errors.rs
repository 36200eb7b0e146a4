use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use reading_auth::{AuthzError, CredentialError, GateError, TokenError};
use reading_core::DomainError;
use reading_infra::StoreError;

/// Everything a handler can fail with, mapped 1:1 onto a status code.
///
/// Auth failures all answer 401 with a fixed message so callers learn
/// nothing about which check rejected them.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthenticated")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthenticated => json_error(StatusCode::UNAUTHORIZED, "unauthenticated", "Unauthorized"),
            ApiError::Forbidden => json_error(StatusCode::UNAUTHORIZED, "forbidden", "Unauthorized"),
            ApiError::InvalidCredentials => {
                json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", "invalid credentials")
            }
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
            ApiError::Unprocessable(msg) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg),
            ApiError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
            ApiError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal server error")
            }
        }
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Unauthenticated => ApiError::Unauthenticated,
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden => ApiError::Forbidden,
        }
    }
}

impl From<CredentialError> for ApiError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidSecret => ApiError::Unprocessable("Required Password".into()),
            CredentialError::MismatchedCredential => ApiError::InvalidCredentials,
            CredentialError::InvalidParams => ApiError::internal(err.to_string()),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding => ApiError::internal(err.to_string()),
            TokenError::BadSignature | TokenError::Expired | TokenError::Malformed => ApiError::Unauthenticated,
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ApiError::Unprocessable(msg),
            DomainError::InvalidId(msg) => ApiError::BadRequest(msg),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound,
            StoreError::Conflict(_) => ApiError::Conflict(err.to_string()),
            StoreError::UnknownAuthor => ApiError::Unprocessable("Unknown Author".into()),
            StoreError::Backend(msg) => ApiError::Internal(msg),
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
