//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store, token codec and credential verifier
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: response DTOs and extraction helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::http::{HeaderName, Method, header};
use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs` and the
/// black-box tests).
pub fn build_app(services: Arc<services::AppServices>) -> Router {
    let auth_state = middleware::AuthState {
        tokens: Arc::clone(&services.tokens),
    };

    // Protected routes: the auth layer runs before any handler or store call.
    let protected = routes::protected_router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        middleware::auth_middleware,
    ));

    routes::public_router().merge(protected).layer(
        ServiceBuilder::new()
            .layer(cors())
            .layer(axum::middleware::from_fn(middleware::request_id_middleware))
            .layer(Extension(services)),
    )
}

/// Any origin; tokens travel in `Authorization`, never in cookies.
fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .expose_headers([
            header::AUTHORIZATION,
            header::LOCATION,
            dto::ENTITY_HEADER,
            HeaderName::from_static(reading_observability::REQUEST_ID_HEADER),
        ])
}
