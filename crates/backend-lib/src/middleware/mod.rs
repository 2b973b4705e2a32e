//! HTTP middleware.

pub mod auth;

pub use auth::{bearer_token, client_ip, require_auth};
