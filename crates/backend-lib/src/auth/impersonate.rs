// ============================
// crates/backend-lib/src/auth/impersonate.rs
// ============================
//! Administrative impersonation broker.
use ::metrics::counter;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::guard::{authorize, Capability};
use crate::auth::token::{Claims, TokenService};
use crate::error::AppError;
use crate::metrics::IMPERSONATION_ISSUED;
use crate::store::CredentialStore;

/// Mints tokens for other principals on behalf of an admin.
///
/// The capability check runs against the acting principal's claims, never
/// the target's identity, and impersonated actors are refused outright so
/// impersonation tokens cannot chain.
#[derive(Clone)]
pub struct ImpersonationBroker {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
}

impl ImpersonationBroker {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    /// Issue an impersonation token for `target_id`.
    ///
    /// Fails `AccessDenied` for non-admin or already-impersonated actors,
    /// `NotFound` when the target does not exist. No token is minted on any
    /// failure path.
    pub async fn issue_for(&self, actor: &Claims, target_id: Uuid) -> Result<String, AppError> {
        if actor.imp {
            return Err(AppError::AccessDenied);
        }
        authorize(actor, Capability::Admin)?;

        let target = self
            .store
            .find_by_id(target_id)
            .await?
            .ok_or(AppError::NotFound("user"))?;

        let token = self.tokens.issue_impersonation(&target)?;
        counter!(IMPERSONATION_ISSUED).increment(1);
        info!(actor = %actor.username, target = %target.username, "impersonation token issued");
        Ok(token)
    }
}
