// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::net::SocketAddr;

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level filter
    pub log_level: String,
    /// Token issuance settings
    pub token: TokenSettings,
    /// Login rate-limit settings
    pub rate_limit: RateLimitSettings,
    /// Privileged-login alert settings
    pub alerts: AlertSettings,
    /// Optional admin account created at startup when no admin exists
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Signed-token settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// HMAC signing secret. No default; an empty secret fails [`Settings::load`].
    pub secret: String,
    /// Session token TTL in seconds
    pub ttl_secs: u64,
    /// Impersonation token TTL in seconds. Kept shorter than `ttl_secs`.
    pub impersonation_ttl_secs: u64,
}

/// Fixed-window login rate-limit settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Window duration in seconds
    pub window_secs: u64,
    /// Maximum login attempts per window and key
    pub max_attempts: u32,
}

/// Webhook channels for privileged-login alerts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Channel receiving admin-tier login alerts
    pub admin_webhook_url: Option<String>,
    /// Channel receiving web-owner-tier login alerts
    pub web_owner_webhook_url: Option<String>,
    /// Delivery timeout in seconds
    pub timeout_secs: u64,
}

/// Bootstrap admin credentials
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdmin {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            log_level: "info".to_string(),
            token: TokenSettings::default(),
            rate_limit: RateLimitSettings::default(),
            alerts: AlertSettings::default(),
            bootstrap_admin: None,
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_secs: 60 * 60, // 1 hour sessions
            impersonation_ttl_secs: 15 * 60,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window_secs: 15 * 60,
            max_attempts: 5,
        }
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            admin_webhook_url: None,
            web_owner_webhook_url: None,
            timeout_secs: 5,
        }
    }
}

impl Settings {
    /// Load settings from `pagevault.toml` and `PAGEVAULT_`-prefixed
    /// environment variables.
    ///
    /// A missing or empty token secret is a hard error: the process must not
    /// come up able to mint unsigned-in-effect tokens.
    pub fn load() -> Result<Self> {
        Self::load_from("pagevault.toml")
    }

    /// Load settings from an explicit config file path plus the environment.
    pub fn load_from(path: &str) -> Result<Self> {
        let settings: Settings = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("PAGEVAULT_").split("__"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.token.secret.is_empty() {
            bail!("token signing secret is not configured (set token.secret or PAGEVAULT_TOKEN__SECRET)");
        }
        if self.token.ttl_secs == 0 {
            bail!("token TTL must be positive");
        }
        if self.token.impersonation_ttl_secs >= self.token.ttl_secs {
            bail!("impersonation TTL must be shorter than the session TTL");
        }
        if self.rate_limit.max_attempts == 0 || self.rate_limit.window_secs == 0 {
            bail!("rate-limit window and attempt count must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::{Format, Toml};

    fn from_toml(toml: &str) -> Result<Settings> {
        let settings: Settings = Figment::new().merge(Toml::string(toml)).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.rate_limit.max_attempts, 5);
        assert_eq!(settings.rate_limit.window_secs, 15 * 60);
        assert!(settings.token.impersonation_ttl_secs < settings.token.ttl_secs);
        assert!(settings.alerts.admin_webhook_url.is_none());
    }

    #[test]
    fn load_fails_without_secret() {
        let err = from_toml("").unwrap_err();
        assert!(err.to_string().contains("secret"));
    }

    #[test]
    fn load_parses_full_config() {
        let settings = from_toml(
            r#"
            bind_addr = "0.0.0.0:9000"
            log_level = "debug"

            [token]
            secret = "test-secret"
            ttl_secs = 1200
            impersonation_ttl_secs = 300

            [rate_limit]
            window_secs = 60
            max_attempts = 3

            [alerts]
            admin_webhook_url = "https://hooks.example.com/admin"
            timeout_secs = 2

            [bootstrap_admin]
            username = "root"
            password = "hunter2hunter2"
            email = "root@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(settings.bind_addr.port(), 9000);
        assert_eq!(settings.token.ttl_secs, 1200);
        assert_eq!(settings.rate_limit.max_attempts, 3);
        assert_eq!(
            settings.alerts.admin_webhook_url.as_deref(),
            Some("https://hooks.example.com/admin")
        );
        assert!(settings.alerts.web_owner_webhook_url.is_none());
        assert_eq!(settings.bootstrap_admin.unwrap().username, "root");
    }

    #[test]
    fn impersonation_ttl_must_undercut_session_ttl() {
        let err = from_toml(
            r#"
            [token]
            secret = "s"
            ttl_secs = 300
            impersonation_ttl_secs = 300
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("impersonation"));
    }
}
