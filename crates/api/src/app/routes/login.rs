use std::sync::Arc;

use axum::{Extension, Json, extract::rejection::JsonRejection};

use reading_core::{Action, UserDraft};

use crate::app::dto::{self, TokenResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// `POST /login`: exchange e-mail and password for a bearer token.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<UserDraft>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let draft = dto::json_body(body)?.prepare();
    draft.validate(Action::Login)?;

    let identity = services.check_credentials(&draft.email, draft.password).await?;
    let token = services.issue_token(identity)?;

    tracing::info!(%identity, "login succeeded");
    Ok(Json(TokenResponse::bearer(token, services.tokens.validity().num_seconds())))
}
