// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router assembly.
//!
//! Protected routes are registered once here and guarded once by the auth
//! middleware, which reads the required capability from the policy table in
//! [`crate::auth::guard`]. Route and policy share the same path strings.
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{auth, pages, users};
use crate::middleware::require_auth;
use crate::AppState;

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let public = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register));

    let protected = Router::new()
        .route("/get-users", get(users::get_users))
        .route("/update-role/{id}", put(users::update_role))
        .route("/delete-user/{id}", delete(users::delete_user))
        .route("/generate-user-token", post(users::generate_user_token))
        .route("/get-pages", get(pages::get_pages))
        .route("/add-page", post(pages::add_page))
        .route("/update-page/{id}", put(pages::update_page))
        .route("/delete-page/{id}", delete(pages::delete_page))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
