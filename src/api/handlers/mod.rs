//! API handlers for the account service.
//!
//! Handlers stay thin: parse the payload, call into the `auth` services or
//! the store, and map the outcome to an HTTP response. Unexpected failures
//! are logged server-side and surfaced as bare 500s.

pub mod email;
pub mod health;
pub mod industries;
pub mod login;
pub mod me;
pub mod phone;
pub mod twofactor;
pub mod types;
pub mod users;

use axum::{
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
};
use regex::Regex;
use tracing::error;

use crate::auth::AuthError;

/// Lightweight email sanity check used before persisting signup data.
pub(crate) fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Map a service error to a response: taxonomy statuses for client errors,
/// sanitized 500s (with the detail logged) for everything else.
pub(crate) fn error_response(err: &AuthError) -> Response {
    if matches!(err, AuthError::Internal(_) | AuthError::Delivery(_)) {
        error!("request failed: {err:#}");
    }
    (err.status(), err.client_message()).into_response()
}

/// Pull the bearer token out of the Authorization header.
pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Shared "missing payload" response for handlers taking `Option<Json<T>>`.
pub(crate) fn missing_payload() -> Response {
    (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn missing_or_malformed_authorization_is_none() {
        let headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
