use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderValue, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::Instrument;

use reading_auth::{TokenCodec, authenticate};
use reading_observability::{REQUEST_ID_HEADER, RequestId};

use crate::app::errors::ApiError;
use crate::context::AuthContext;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<TokenCodec>,
}

/// Reject the request unless it carries a valid bearer token; otherwise
/// attach the token's identity as an [`AuthContext`].
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let identity = authenticate(&state.tokens, header, Utc::now())?;

    req.extensions_mut().insert(AuthContext::new(identity));

    Ok(next.run(req).instrument(tracing::debug_span!("authenticated", %identity)).await)
}

/// Run each request inside a span tagged with a request id, and echo the id
/// back in `x-request-id`. A well-formed incoming id is reused.
pub async fn request_id_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(RequestId::parse)
        .unwrap_or_default();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    req.extensions_mut().insert(request_id);

    let mut response = next.run(req).instrument(span.clone()).await;

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    span.in_scope(|| tracing::info!(status = response.status().as_u16(), "request completed"));

    response
}
