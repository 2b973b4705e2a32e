// ============================
// crates/backend-lib/src/handlers/pages.rs
// ============================
//! Page CRUD handlers, scoped to the authenticated subject.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::token::Claims;
use crate::error::AppError;
use crate::store::PageStore;
use crate::AppState;
use pagevault_common::{MessageResponse, Page, PageRequest, PageResponse};

fn validate(req: &PageRequest) -> Result<(), AppError> {
    if req.title.is_empty() || req.content.is_empty() {
        return Err(AppError::Validation(
            "Title and content are required".to_string(),
        ));
    }
    Ok(())
}

/// `GET /get-pages`
///
/// A fresh account gets a welcome page seeded on first listing.
pub async fn get_pages(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Page>>, AppError> {
    let pages = state.pages.list_for_user(claims.sub).await?;
    if !pages.is_empty() {
        return Ok(Json(pages));
    }

    let welcome = state
        .pages
        .create(
            claims.sub,
            "Welcome Page".to_string(),
            "This is your first page. Edit it from the dashboard.".to_string(),
        )
        .await?;
    Ok(Json(vec![welcome]))
}

/// `POST /add-page`
pub async fn add_page(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<PageRequest>,
) -> Result<(StatusCode, Json<PageResponse>), AppError> {
    validate(&req)?;
    let page = state
        .pages
        .create(claims.sub, req.title, req.content)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PageResponse {
            message: "Page added successfully".to_string(),
            page,
        }),
    ))
}

/// `PUT /update-page/{id}`
pub async fn update_page(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<PageRequest>,
) -> Result<Json<PageResponse>, AppError> {
    validate(&req)?;
    let page = state
        .pages
        .update(id, claims.sub, req.title, req.content)
        .await?;
    Ok(Json(PageResponse {
        message: "Page updated successfully".to_string(),
        page,
    }))
}

/// `DELETE /delete-page/{id}`
pub async fn delete_page(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.pages.delete(id, claims.sub).await?;
    Ok(Json(MessageResponse {
        message: "Page deleted successfully".to_string(),
    }))
}
