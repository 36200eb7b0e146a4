use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use reading_core::{BookDraft, BookId};
use reading_infra::NewBook;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz::{require_mutation, require_owner};
use crate::context::AuthContext;

/// `POST /books`: the payload's `author_id` must be the caller.
pub async fn create_book(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    body: Result<Json<BookDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let draft = dto::json_body(body)?.prepare();
    let author_id = draft.validate()?;
    require_owner(&ctx, author_id)?;

    let book = services
        .store
        .create_book(NewBook {
            title: draft.title,
            content: draft.content,
            author_id,
        })
        .await?;
    tracing::info!(book = %book.id, %author_id, "book created");

    Ok((StatusCode::CREATED, dto::location(format!("/books/{}", book.id)), Json(book)).into_response())
}

pub async fn list_books(Extension(services): Extension<Arc<AppServices>>) -> Result<Response, ApiError> {
    let books = services.store.list_books().await?;
    Ok(Json(books).into_response())
}

pub async fn get_book(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: BookId = dto::parse_id(&id)?;
    let book = services.store.find_book(id).await?;
    Ok(Json(book).into_response())
}

/// `PUT /books/:id`: the caller must own the book as stored *and* may not
/// hand it to another author.
pub async fn update_book(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Result<Json<BookDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id: BookId = dto::parse_id(&id)?;
    let owner = services.store.book_owner(id).await?;

    let draft = dto::json_body(body)?.prepare();
    require_mutation(&ctx, owner, draft.author_id)?;
    let author_id = draft.validate()?;

    let book = services
        .store
        .update_book(
            id,
            NewBook {
                title: draft.title,
                content: draft.content,
                author_id,
            },
        )
        .await?;
    Ok(Json(book).into_response())
}

pub async fn delete_book(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id: BookId = dto::parse_id(&id)?;
    let owner = services.store.book_owner(id).await?;
    require_owner(&ctx, owner)?;

    services.store.delete_book(id).await?;
    tracing::info!(book = %id, "book deleted");
    Ok((StatusCode::NO_CONTENT, dto::entity(id)).into_response())
}
