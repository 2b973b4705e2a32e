// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed bearer-token issuance and verification.
//!
//! Tokens bind an identity snapshot to a fixed expiry under a process-wide
//! secret. Verification is stateless and pure: a token is either valid claims
//! or exactly one of [`TokenError`]'s kinds, so callers can map expiry and
//! tampering to different HTTP statuses.
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::guard::Capability;
use crate::error::AppError;
use crate::store::User;
use pagevault_common::RoleFlags;

/// Claims embedded in a signed token.
///
/// Role flags are a snapshot at issuance time; later role changes do not
/// retroactively affect issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject user id
    pub sub: Uuid,
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_owner: bool,
    #[serde(default)]
    pub is_web_owner: bool,
    /// Set on impersonation tokens; such tokens cannot mint further ones
    #[serde(default)]
    pub imp: bool,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Expiry, seconds since epoch. Always greater than `iat`.
    pub exp: i64,
}

impl Claims {
    pub fn flags(&self) -> RoleFlags {
        RoleFlags {
            is_admin: self.is_admin,
            is_owner: self.is_owner,
            is_web_owner: self.is_web_owner,
        }
    }

    pub fn capability(&self) -> Capability {
        Capability::from_flags(&self.flags())
    }
}

/// Verification failure kinds. Expiry is distinct from tampering: the former
/// means "log in again", the latter means a garbled or forged token.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
}

/// Token issuer/verifier bound to the server secret.
///
/// The secret is read-only configuration loaded once at startup; its absence
/// is a startup failure, never a runtime one.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    impersonation_ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_secs: u64, impersonation_ttl_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exact expiry, no leeway
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl: Duration::seconds(ttl_secs as i64),
            impersonation_ttl: Duration::seconds(impersonation_ttl_secs as i64),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        self.ttl
    }

    pub fn impersonation_ttl(&self) -> Duration {
        self.impersonation_ttl
    }

    /// Issue a session token carrying the user's identity snapshot.
    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        self.sign(Self::claims_for(user, self.ttl, false))
    }

    /// Issue an impersonation token for the target user. Marked `imp` and
    /// time-boxed to the shorter impersonation TTL.
    pub fn issue_impersonation(&self, target: &User) -> Result<String, AppError> {
        self.sign(Self::claims_for(target, self.impersonation_ttl, true))
    }

    fn claims_for(user: &User, ttl: Duration, imp: bool) -> Claims {
        let now = Utc::now();
        Claims {
            sub: user.id,
            username: user.username.clone(),
            is_admin: user.flags.is_admin,
            is_owner: user.flags.is_owner,
            is_web_owner: user.flags.is_web_owner,
            imp,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    fn sign(&self, claims: Claims) -> Result<String, AppError> {
        debug_assert!(claims.exp > claims.iat);
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        match decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(err) => Err(match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::Malformed,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret-key-12345", 3600, 900)
    }

    fn test_user(flags: RoleFlags) -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "hash".to_string(),
            flags,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn issue_then_verify_returns_claims_unchanged() {
        let svc = service();
        let user = test_user(RoleFlags {
            is_admin: true,
            ..RoleFlags::default()
        });

        let token = svc.issue(&user).unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
        assert!(claims.is_admin);
        assert!(!claims.is_web_owner);
        assert!(!claims.imp);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn expired_token_fails_expired_not_signature_invalid() {
        let svc = service();
        let user = test_user(RoleFlags::default());
        let mut claims = TokenService::claims_for(&user, Duration::seconds(3600), false);
        claims.iat -= 7200;
        claims.exp -= 7200;

        let token = svc.sign(claims).unwrap();
        assert_eq!(svc.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_secret_fails_signature_invalid() {
        let svc = service();
        let other = TokenService::new("a-different-secret", 3600, 900);
        let token = other.issue(&test_user(RoleFlags::default())).unwrap();

        assert_eq!(svc.verify(&token), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn tampered_payload_fails_signature_invalid() {
        let svc = service();
        let token = svc.issue(&test_user(RoleFlags::default())).unwrap();

        // graft in the payload of a token for a different, privileged user
        let mut admin = test_user(RoleFlags {
            is_admin: true,
            ..RoleFlags::default()
        });
        admin.username = "mallory".to_string();
        let donor = svc.issue(&admin).unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let donor_parts: Vec<&str> = donor.split('.').collect();
        assert_eq!(parts.len(), 3);
        parts[1] = donor_parts[1];
        let tampered = parts.join(".");

        assert_eq!(svc.verify(&tampered), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn garbage_fails_malformed() {
        let svc = service();
        assert_eq!(svc.verify("not a token"), Err(TokenError::Malformed));
        assert_eq!(svc.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn impersonation_tokens_are_marked_and_short_lived() {
        let svc = service();
        let target = test_user(RoleFlags::default());

        let token = svc.issue_impersonation(&target).unwrap();
        let claims = svc.verify(&token).unwrap();

        assert!(claims.imp);
        assert_eq!(claims.sub, target.id);
        assert_eq!(claims.exp - claims.iat, 900);
        assert!(svc.impersonation_ttl() < svc.session_ttl());
    }

    #[test]
    fn capability_snapshot_travels_in_claims() {
        let svc = service();
        let owner = test_user(RoleFlags {
            is_admin: true,
            is_web_owner: true,
            ..RoleFlags::default()
        });

        let claims = svc.verify(&svc.issue(&owner).unwrap()).unwrap();
        assert_eq!(claims.capability(), Capability::WebOwner);
    }
}
