// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::auth::token::TokenError;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authorization token missing")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Access denied")]
    AccessDenied,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Username or email already exists")]
    DuplicateIdentity,

    #[error("Too many login attempts, please try again later")]
    RateLimited { retry_after_secs: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MissingToken
            | AppError::InvalidToken
            | AppError::ExpiredToken
            | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateIdentity => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::MissingToken => "AUTH_001",
            AppError::InvalidToken => "AUTH_002",
            AppError::ExpiredToken => "AUTH_003",
            AppError::InvalidCredentials => "AUTH_004",
            AppError::AccessDenied => "AUTHZ_001",
            AppError::NotFound(_) => "NF_001",
            AppError::DuplicateIdentity => "DUP_001",
            AppError::RateLimited { .. } => "RATE_001",
            AppError::Internal(_) => "INT_001",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
        }
    }

    /// Get a sanitized message suitable for production use.
    ///
    /// Auth subtypes keep distinct wording so clients can tell a stale
    /// session from a garbled token; everything internal collapses to a
    /// generic message.
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::MissingToken => "Authorization token missing".to_string(),
            AppError::InvalidToken => "Invalid token".to_string(),
            AppError::ExpiredToken => "Token expired".to_string(),
            AppError::InvalidCredentials => "Invalid username or password".to_string(),
            AppError::AccessDenied => "Access denied".to_string(),
            AppError::NotFound(what) => format!("{what} not found"),
            AppError::DuplicateIdentity => "Username or email already exists".to_string(),
            AppError::RateLimited { .. } => {
                "Too many login attempts, please try again later".to_string()
            },
            AppError::Json(_) => "Invalid request format".to_string(),
            AppError::Internal(_) | AppError::Io(_) => {
                "An internal server error occurred".to_string()
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code = error_code, detail = %self, "internal error");
        }

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        // Create a JSON response with error details
        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        let mut response = (status, axum::Json(body)).into_response();
        if let AppError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = retry_after_secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::ExpiredToken,
            TokenError::SignatureInvalid | TokenError::Malformed => AppError::InvalidToken,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Validation("missing fields".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::MissingToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::ExpiredToken.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::AccessDenied.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("user").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::DuplicateIdentity.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::RateLimited { retry_after_secs: 60 }.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_subtypes_have_distinct_codes() {
        let codes = [
            AppError::MissingToken.error_code(),
            AppError::InvalidToken.error_code(),
            AppError::ExpiredToken.error_code(),
            AppError::InvalidCredentials.error_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in codes.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_sanitized_messages_keep_auth_distinctions() {
        // a client must be able to tell "log in again" from "bad token"
        assert_ne!(
            AppError::ExpiredToken.sanitized_message(),
            AppError::InvalidToken.sanitized_message()
        );
        assert_ne!(
            AppError::MissingToken.sanitized_message(),
            AppError::InvalidToken.sanitized_message()
        );
        // but internal detail never leaks
        assert_eq!(
            AppError::Internal("connection pool exhausted".to_string()).sanitized_message(),
            "An internal server error occurred"
        );
    }

    #[test]
    fn test_token_error_mapping() {
        assert!(matches!(
            AppError::from(TokenError::Expired),
            AppError::ExpiredToken
        ));
        assert!(matches!(
            AppError::from(TokenError::SignatureInvalid),
            AppError::InvalidToken
        ));
        assert!(matches!(
            AppError::from(TokenError::Malformed),
            AppError::InvalidToken
        ));
    }

    #[test]
    fn test_rate_limited_response_has_retry_after() {
        let response = AppError::RateLimited { retry_after_secs: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            "42"
        );
    }

    #[test]
    fn test_error_into_response_is_json() {
        let response = AppError::NotFound("user").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }
}
