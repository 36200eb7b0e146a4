use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use reading_core::{Action, AuthorDraft, Identity};

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::require_owner;
use crate::context::AuthContext;

pub async fn create_author(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<AuthorDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let draft = dto::json_body(body)?.prepare();
    draft.validate(Action::Create)?;

    let author = services.store.create_author(draft).await?;
    tracing::info!(identity = %author.id, "author created");

    Ok((StatusCode::CREATED, dto::location(format!("/authors/{}", author.id)), Json(author)).into_response())
}

pub async fn list_authors(Extension(services): Extension<Arc<AppServices>>) -> Result<Response, ApiError> {
    let authors = services.store.list_authors().await?;
    Ok(Json(authors).into_response())
}

pub async fn get_author(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: Identity = dto::parse_id(&id)?;
    let author = services.store.find_author(id).await?;
    Ok(Json(author).into_response())
}

pub async fn update_author(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Result<Json<AuthorDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id: Identity = dto::parse_id(&id)?;
    require_owner(&ctx, id)?;

    let draft = dto::json_body(body)?.prepare();
    draft.validate(Action::Update)?;

    let author = services.store.update_author(id, draft).await?;
    Ok(Json(author).into_response())
}

/// Deleting an author also deletes their books.
pub async fn delete_author(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: Identity = dto::parse_id(&id)?;
    require_owner(&ctx, id)?;

    services.store.delete_author(id).await?;
    tracing::info!(identity = %id, "author deleted");
    Ok((StatusCode::NO_CONTENT, dto::entity(id)).into_response())
}
