// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the `PageVault` server.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod notify;
pub mod router;
pub mod store;

use std::sync::Arc;

use crate::auth::{ImpersonationBroker, LoginRateLimiter, TokenService};
use crate::config::Settings;
use crate::error::AppError;
use crate::notify::LoginAlertNotifier;
use crate::store::{CredentialStore, InMemoryCredentialStore, InMemoryPageStore, PageStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Settings snapshot
    pub settings: Arc<Settings>,
    /// Credential store
    pub credentials: Arc<dyn CredentialStore>,
    /// Page store
    pub pages: Arc<dyn PageStore>,
    /// Token issuer/verifier
    pub tokens: Arc<TokenService>,
    /// Login rate limiter
    pub rate_limiter: Arc<LoginRateLimiter>,
    /// Privileged-login notifier
    pub notifier: Arc<LoginAlertNotifier>,
    /// Impersonation broker
    pub impersonation: ImpersonationBroker,
}

impl AppState {
    /// Create application state over injected stores.
    pub fn new(
        settings: Settings,
        credentials: Arc<dyn CredentialStore>,
        pages: Arc<dyn PageStore>,
    ) -> Result<Self, AppError> {
        if settings.token.secret.is_empty() {
            return Err(AppError::Internal(
                "token signing secret is not configured".to_string(),
            ));
        }

        let tokens = Arc::new(TokenService::new(
            &settings.token.secret,
            settings.token.ttl_secs,
            settings.token.impersonation_ttl_secs,
        ));
        let rate_limiter = Arc::new(LoginRateLimiter::from_settings(&settings.rate_limit));
        let notifier = Arc::new(LoginAlertNotifier::from_settings(&settings.alerts)?);
        let impersonation = ImpersonationBroker::new(credentials.clone(), tokens.clone());

        Ok(Self {
            settings: Arc::new(settings),
            credentials,
            pages,
            tokens,
            rate_limiter,
            notifier,
            impersonation,
        })
    }

    /// Create application state backed by fresh in-memory stores.
    pub fn in_memory(settings: Settings) -> Result<Self, AppError> {
        Self::new(
            settings,
            Arc::new(InMemoryCredentialStore::new()),
            Arc::new(InMemoryPageStore::new()),
        )
    }
}
