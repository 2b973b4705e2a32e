// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! Admin user-management handlers.
//!
//! Capability enforcement happens in the auth middleware via the route
//! policy table; these handlers assume an already-authorized caller.
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::token::Claims;
use crate::error::AppError;
use crate::store::CredentialStore;
use crate::AppState;
use pagevault_common::{
    ImpersonateRequest, MessageResponse, PublicUser, TokenResponse, UpdateRoleRequest,
};

/// `GET /get-users`: sanitized listing, no password hashes.
pub async fn get_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = state.credentials.list().await?;
    Ok(Json(users.iter().map(|user| user.to_public()).collect()))
}

/// `PUT /update-role/{id}`
///
/// Merges the provided flags over the user's current ones. Tokens already
/// issued to the user keep their snapshot until they expire.
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .credentials
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let mut flags = user.flags;
    if let Some(is_admin) = req.is_admin {
        flags.is_admin = is_admin;
    }
    if let Some(is_owner) = req.is_owner {
        flags.is_owner = is_owner;
    }
    if let Some(is_web_owner) = req.is_web_owner {
        flags.is_web_owner = is_web_owner;
    }

    let updated = state.credentials.set_role_flags(id, flags).await?;
    info!(actor = %actor.username, target = %updated.username, "role flags updated");
    Ok(Json(updated.to_public()))
}

/// `POST /generate-user-token`: impersonation.
pub async fn generate_user_token(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Claims>,
    Json(req): Json<ImpersonateRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let target_id = req
        .user_id
        .ok_or_else(|| AppError::Validation("userId is required".to_string()))?;
    let token = state.impersonation.issue_for(&actor, target_id).await?;
    Ok(Json(TokenResponse { token }))
}

/// `DELETE /delete-user/{id}`
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    state.credentials.delete(id).await?;
    info!(actor = %actor.username, target = %id, "user deleted");
    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
