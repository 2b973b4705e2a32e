// ============================
// crates/backend-lib/src/auth/guard.rs
// ============================
//! Role capability guard and route policy.
//!
//! Capabilities form a single ordered ladder replacing the upstream boolean
//! flag soup; one precedence function maps flags to a capability and one
//! table maps routes to requirements. The guard is a pure function of claims
//! and requirement, callable without any HTTP machinery.
use crate::auth::token::Claims;
use crate::error::AppError;
use pagevault_common::RoleFlags;

/// Authorization level required to access a route.
///
/// `None` means "any authenticated user". Higher capabilities imply the
/// lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Capability {
    None,
    Admin,
    Owner,
    WebOwner,
}

impl Capability {
    /// Resolve a user's capability from their role flags.
    ///
    /// Precedence: WebOwner over Owner over Admin; flags below the winning
    /// tier are ignored.
    pub fn from_flags(flags: &RoleFlags) -> Self {
        if flags.is_web_owner {
            Capability::WebOwner
        } else if flags.is_owner {
            Capability::Owner
        } else if flags.is_admin {
            Capability::Admin
        } else {
            Capability::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::None => "none",
            Capability::Admin => "admin",
            Capability::Owner => "owner",
            Capability::WebOwner => "webowner",
        }
    }
}

/// Authoritative route → required capability table.
///
/// The auth middleware consults this through the request's matched path, so
/// a route cannot silently drift away from its policy. Routes absent from
/// the table require authentication only.
pub const ROUTE_POLICY: &[(&str, Capability)] = &[
    ("/get-users", Capability::Admin),
    ("/update-role/{id}", Capability::Admin),
    ("/delete-user/{id}", Capability::Admin),
    ("/generate-user-token", Capability::Admin),
    ("/get-pages", Capability::None),
    ("/add-page", Capability::None),
    ("/update-page/{id}", Capability::None),
    ("/delete-page/{id}", Capability::None),
];

/// Capability required for a matched route path.
pub fn required_capability(route: &str) -> Capability {
    ROUTE_POLICY
        .iter()
        .find(|(path, _)| *path == route)
        .map(|(_, capability)| *capability)
        .unwrap_or(Capability::None)
}

/// Check claims against a required capability.
///
/// Pure function; performs no I/O. Denial is 403, distinct from the
/// verifier's 401.
pub fn authorize(claims: &Claims, required: Capability) -> Result<(), AppError> {
    if claims.capability() >= required {
        Ok(())
    } else {
        Err(AppError::AccessDenied)
    }
}
