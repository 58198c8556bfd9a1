//! Error taxonomy for the authentication and verification core.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// User or record absent.
    #[error("not found")]
    NotFound,

    /// Login failed: unknown email or wrong password.
    #[error("Invalid email or password")]
    InvalidCredential,

    /// Verification code absent, stale, or wrong.
    #[error("Invalid verification code")]
    InvalidCode,

    /// Phone verification soft lockout after 3 sends.
    #[error("Too many requests")]
    TooManyAttempts,

    /// Missing required field or unsupported method/eventType.
    #[error("{0}")]
    BadRequest(String),

    /// The notifier could not deliver.
    #[error("delivery failed: {0}")]
    Delivery(anyhow::Error),

    /// Expired or malformed session token.
    #[error("Failed to authenticate token")]
    TokenInvalid,

    /// Unexpected storage or internal failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// HTTP status this error maps to at the handler boundary.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredential | Self::InvalidCode | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }
            Self::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Delivery(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-safe message. Internal and delivery errors are sanitized so
    /// provider or storage detail never reaches the response body.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Delivery(_) | Self::Internal(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(AuthError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::InvalidCredential.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::InvalidCode.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::TooManyAttempts.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::BadRequest("missing".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::TokenInvalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::Internal(anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let err = AuthError::Internal(anyhow!("connection refused to db.internal:5432"));
        assert_eq!(err.client_message(), "Internal Server Error");

        let err = AuthError::Delivery(anyhow!("twilio 401"));
        assert_eq!(err.client_message(), "Internal Server Error");
    }

    #[test]
    fn bad_request_keeps_its_message() {
        let err = AuthError::BadRequest("Invalid verification method".into());
        assert_eq!(err.client_message(), "Invalid verification method");
    }
}
