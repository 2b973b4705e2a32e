// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! Login and registration handlers.
use ::metrics::counter;
use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::rate_limit::Decision;
use crate::error::AppError;
use crate::metrics::{LOGIN_FAILURE, LOGIN_RATE_LIMITED, LOGIN_SUCCESS, USER_REGISTERED};
use crate::middleware::client_ip;
use crate::store::{CredentialStore, NewUser};
use crate::AppState;
use pagevault_common::{LoginRequest, RegisterRequest, RegisterResponse, RoleFlags, TokenResponse};

/// `POST /login`
///
/// Every attempt counts against the caller's rate-limit window, successful
/// or not, before credentials are even looked at.
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let source_ip = client_ip(&headers);
    if let Decision::Deny { retry_after } = state.rate_limiter.check(&source_ip) {
        counter!(LOGIN_RATE_LIMITED).increment(1);
        return Err(AppError::RateLimited {
            retry_after_secs: retry_after.as_secs().max(1),
        });
    }

    if req.username.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let user = state
        .credentials
        .find_by_username(&req.username)
        .await?
        .filter(|user| verify_password(&user.password_hash, &req.password));
    let Some(user) = user else {
        counter!(LOGIN_FAILURE).increment(1);
        return Err(AppError::InvalidCredentials);
    };

    let now = Utc::now();
    state.credentials.update_last_login(user.id, now).await?;
    let token = state.tokens.issue(&user)?;

    // best-effort, off the request path
    state.notifier.notify_login(&user, &source_ip, now);

    counter!(LOGIN_SUCCESS).increment(1);
    info!(username = %user.username, %source_ip, "login succeeded");
    Ok(Json(TokenResponse { token }))
}

/// `POST /register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    if req.username.is_empty() || req.password.is_empty() || req.email.is_empty() {
        return Err(AppError::Validation("All fields are required".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = state
        .credentials
        .create(NewUser {
            username: req.username,
            email: req.email,
            password_hash,
            flags: RoleFlags::default(),
        })
        .await?;

    counter!(USER_REGISTERED).increment(1);
    info!(username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: user.to_public(),
        }),
    ))
}
