// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! shared between the `PageVault` backend and its clients.
//! This module defines the HTTP request/response bodies and supporting types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role flags attached to a user account.
///
/// The flags are independent booleans on the wire; precedence between them is
/// resolved server-side by a single capability ladder.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoleFlags {
    /// Administrative access to user management
    #[serde(default)]
    pub is_admin: bool,
    /// Site owner
    #[serde(default)]
    pub is_owner: bool,
    /// Web owner (highest tier)
    #[serde(default)]
    pub is_web_owner: bool,
}

/// A user record as returned to clients.
///
/// Never carries the password hash; sanitization happens at construction.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(flatten)]
    pub flags: RoleFlags,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Body of `POST /login`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Body of `POST /register`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
}

/// Response carrying a freshly issued bearer token
/// (login and impersonation both use this shape).
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub token: String,
}

/// Response to a successful registration
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterResponse {
    pub message: String,
    pub user: PublicUser,
}

/// Body of `PUT /update-role/{id}`
///
/// All fields optional; absent flags are left unchanged.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub is_admin: Option<bool>,
    pub is_owner: Option<bool>,
    pub is_web_owner: Option<bool>,
}

/// Body of `POST /generate-user-token`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImpersonateRequest {
    pub user_id: Option<Uuid>,
}

/// A single page in the document store
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /add-page` and `PUT /update-page/{id}`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PageRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Response wrapping a created or updated page
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PageResponse {
    pub message: String,
    pub page: Page,
}

/// Plain acknowledgement body
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}

/// JSON error body returned by the backend
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Error detail inside [`ErrorBody`]
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
