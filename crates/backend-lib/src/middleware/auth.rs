use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::guard::{authorize, required_capability, Capability};
use crate::error::AppError;
use crate::AppState;

/// Bearer authentication + policy enforcement middleware.
///
/// Verifies the token, looks up the matched route in the policy table and
/// checks the claims' capability against it, then exposes the claims to the
/// handler as a request extension. Missing, expired and invalid tokens map
/// to distinct 401s; an insufficient capability is 403.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or(AppError::MissingToken)?;
    let claims = state.tokens.verify(token)?;

    let required = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| required_capability(path.as_str()))
        .unwrap_or(Capability::None);
    authorize(&claims, required)?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

/// Client address for rate limiting and audit, from the `x-real-ip` header
/// the reverse proxy sets. Sources without one share the fallback bucket.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}
