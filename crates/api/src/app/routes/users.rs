use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use reading_core::{Action, Identity, UserDraft};
use reading_infra::NewUser;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::require_owner;
use crate::context::AuthContext;

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<UserDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let draft = dto::json_body(body)?.prepare();
    draft.validate(Action::Create)?;

    let user = services.store.create_user(new_user(&services, draft).await?).await?;
    tracing::info!(identity = %user.id, "user created");

    Ok((StatusCode::CREATED, dto::location(format!("/users/{}", user.id)), Json(user)).into_response())
}

pub async fn list_users(Extension(services): Extension<Arc<AppServices>>) -> Result<Response, ApiError> {
    let users = services.store.list_users().await?;
    Ok(Json(users).into_response())
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: Identity = dto::parse_id(&id)?;
    let user = services.store.find_user(id).await?;
    Ok(Json(user).into_response())
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Result<Json<UserDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id: Identity = dto::parse_id(&id)?;
    require_owner(&ctx, id)?;

    let draft = dto::json_body(body)?.prepare();
    draft.validate(Action::Update)?;

    let user = services.store.update_user(id, new_user(&services, draft).await?).await?;
    Ok(Json(user).into_response())
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: Identity = dto::parse_id(&id)?;
    require_owner(&ctx, id)?;

    services.store.delete_user(id).await?;
    tracing::info!(identity = %id, "user deleted");
    Ok((StatusCode::NO_CONTENT, dto::entity(id)).into_response())
}

async fn new_user(services: &AppServices, draft: UserDraft) -> Result<NewUser, ApiError> {
    let password_hash = services.hash_password(draft.password).await?;
    Ok(NewUser {
        nickname: draft.nickname,
        email: draft.email,
        password_hash,
    })
}
