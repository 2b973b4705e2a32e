// ============================
// crates/backend-lib/src/notify.rs
// ============================
//! Best-effort webhook notification for privileged logins.
//!
//! Delivery runs on a spawned task with a bounded timeout; a slow or broken
//! channel can never delay or fail the login that triggered it. Failures are
//! logged and dropped, not retried.
use ::metrics::counter;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth::guard::Capability;
use crate::config::AlertSettings;
use crate::error::AppError;
use crate::metrics::{ALERT_FAILED, ALERT_SENT};
use crate::store::User;

/// Alert tier, routing to its own channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertTier {
    Admin,
    WebOwner,
}

impl AlertTier {
    /// Tier for a capability, if the login warrants an alert at all.
    pub fn for_capability(capability: Capability) -> Option<Self> {
        match capability {
            Capability::WebOwner => Some(AlertTier::WebOwner),
            Capability::Owner | Capability::Admin => Some(AlertTier::Admin),
            Capability::None => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            AlertTier::Admin => "ADMIN",
            AlertTier::WebOwner => "WEB-OWNER",
        }
    }
}

/// Privileged-login notifier with one webhook channel per tier
pub struct LoginAlertNotifier {
    client: reqwest::Client,
    admin_url: Option<String>,
    web_owner_url: Option<String>,
    timeout: Duration,
}

impl LoginAlertNotifier {
    pub fn from_settings(settings: &AlertSettings) -> Result<Self, AppError> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("webhook client: {e}")))?;
        Ok(Self {
            client,
            admin_url: settings.admin_webhook_url.clone(),
            web_owner_url: settings.web_owner_webhook_url.clone(),
            timeout,
        })
    }

    /// Fire a login alert when the user carries a privileged capability.
    ///
    /// Returns immediately; the delivery attempt happens on its own task.
    pub fn notify_login(&self, user: &User, source_ip: &str, at: DateTime<Utc>) {
        let capability = Capability::from_flags(&user.flags);
        let Some(tier) = AlertTier::for_capability(capability) else {
            return;
        };
        let Some(url) = self.channel_for(tier) else {
            debug!(tier = tier.label(), "no webhook channel configured, skipping alert");
            return;
        };

        let payload = format_alert(tier, &user.username, at, source_ip);
        let client = self.client.clone();
        let url = url.to_string();
        let timeout = self.timeout;

        tokio::spawn(async move {
            let send = client.post(&url).body(payload).send();
            match tokio::time::timeout(timeout, send).await {
                Ok(Ok(response)) if response.status().is_success() => {
                    counter!(ALERT_SENT).increment(1);
                },
                Ok(Ok(response)) => {
                    counter!(ALERT_FAILED).increment(1);
                    warn!(status = %response.status(), "login alert rejected by webhook");
                },
                Ok(Err(err)) => {
                    counter!(ALERT_FAILED).increment(1);
                    warn!(error = %err, "login alert delivery failed");
                },
                Err(_) => {
                    counter!(ALERT_FAILED).increment(1);
                    warn!("login alert delivery timed out");
                },
            }
        });
    }

    fn channel_for(&self, tier: AlertTier) -> Option<&str> {
        match tier {
            AlertTier::Admin => self.admin_url.as_deref(),
            AlertTier::WebOwner => self.web_owner_url.as_deref(),
        }
    }
}

/// Plain-text alert payload: tier, username, ISO-8601 timestamp, source IP.
fn format_alert(tier: AlertTier, username: &str, at: DateTime<Utc>, source_ip: &str) -> String {
    format!(
        "[{} LOGIN] user={} time={} ip={}",
        tier.label(),
        username,
        at.to_rfc3339(),
        source_ip
    )
}
