//! Email verification endpoints.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde_json::json;
use std::sync::Arc;

use super::types::{StatusResponse, ValidateEmailRequest, VerifyEmailRequest};
use super::{error_response, missing_payload};
use crate::auth::{AuthError, EmailVerificationService};

#[utoipa::path(
    post,
    path = "/v1/verify_email",
    request_body = VerifyEmailRequest,
    responses(
        (status = 200, description = "Email verification code sent"),
        (status = 400, description = "Unknown user or mismatched email"),
        (status = 500, description = "Server error")
    ),
    tag = "signup"
)]
pub async fn send_verification(
    service: Extension<Arc<EmailVerificationService>>,
    payload: Option<Json<VerifyEmailRequest>>,
) -> impl IntoResponse {
    let request: VerifyEmailRequest = match payload {
        Some(Json(payload)) => payload,
        None => return missing_payload(),
    };

    match service.send_code(request.user_id, &request.email).await {
        Ok(()) => (StatusCode::OK, Json(json!({}))).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/v1/validate_email",
    request_body = ValidateEmailRequest,
    responses(
        (status = 200, description = "Email verified successfully", body = StatusResponse),
        (status = 301, description = "Unauthorized. User does not exist", body = StatusResponse),
        (status = 500, description = "Server error")
    ),
    tag = "signup"
)]
pub async fn validate(
    service: Extension<Arc<EmailVerificationService>>,
    payload: Option<Json<ValidateEmailRequest>>,
) -> impl IntoResponse {
    let request: ValidateEmailRequest = match payload {
        Some(Json(payload)) => payload,
        None => return missing_payload(),
    };

    match service.validate_code(request.user_id, &request.token).await {
        Ok(()) => (
            StatusCode::OK,
            Json(StatusResponse {
                status: "verified".to_string(),
            }),
        )
            .into_response(),
        // The legacy contract reports a mismatch as a 301 with a status body.
        Err(AuthError::InvalidCode) => (
            StatusCode::MOVED_PERMANENTLY,
            Json(StatusResponse {
                status: "Unauthorized. User does not exist".to_string(),
            }),
        )
            .into_response(),
        Err(err) => error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::EmailConfig;
    use crate::notify::LogNotifier;
    use axum::response::IntoResponse;
    use sqlx::postgres::PgPoolOptions;

    fn service() -> Arc<EmailVerificationService> {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        Arc::new(EmailVerificationService::new(
            pool,
            Arc::new(LogNotifier),
            EmailConfig::new("https://devservices.oshinstar.com/lambda/email-verifier".to_string()),
        ))
    }

    #[tokio::test]
    async fn send_missing_payload_is_bad_request() {
        let response = send_verification(Extension(service()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validate_missing_payload_is_bad_request() {
        let response = validate(Extension(service()), None).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
