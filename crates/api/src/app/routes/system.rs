use axum::{Extension, Json, http::StatusCode, response::IntoResponse};

use crate::app::dto::WhoAmI;
use crate::context::AuthContext;

pub async fn home() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "reading-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<AuthContext>) -> Json<WhoAmI> {
    Json(WhoAmI {
        identity: ctx.identity(),
    })
}
