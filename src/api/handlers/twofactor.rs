//! Two-factor operations, dispatched by event type on a single endpoint.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde_json::json;
use std::sync::Arc;

use super::types::{TotpValidationResponse, TwoFactorRequest, TwoFactorSetupResponse};
use super::{error_response, missing_payload};
use crate::auth::{AuthError, TwoFactorService};

#[utoipa::path(
    post,
    path = "/v3/auth",
    request_body = TwoFactorRequest,
    responses(
        (status = 200, description = "Successful operation; shape depends on eventType"),
        (status = 400, description = "Unsupported eventType or missing field"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Server error")
    ),
    tag = "auth"
)]
pub async fn two_factor(
    service: Extension<Arc<TwoFactorService>>,
    payload: Option<Json<TwoFactorRequest>>,
) -> impl IntoResponse {
    let request: TwoFactorRequest = match payload {
        Some(Json(payload)) => payload,
        None => return missing_payload(),
    };

    match request.event_type.as_str() {
        "request_qr" => match service.request_setup(request.client_id).await {
            Ok(setup) => {
                let response = TwoFactorSetupResponse {
                    link: setup.provisioning_uri,
                    key: setup.secret,
                    formatted_key: setup.masked_secret,
                };
                (StatusCode::OK, Json(response)).into_response()
            }
            Err(err) => error_response(&err),
        },
        "validate_totp" => {
            let Some(code) = request.totp.as_deref() else {
                return error_response(&AuthError::BadRequest("Missing totp code".to_string()));
            };
            let valid = service.validate_code(request.client_id, code).await;
            (StatusCode::OK, Json(TotpValidationResponse { valid })).into_response()
        }
        "disable_2fa" => match service.disable(request.client_id).await {
            Ok(()) => (StatusCode::OK, Json(json!({}))).into_response(),
            Err(err) => error_response(&err),
        },
        _ => error_response(&AuthError::BadRequest("Invalid eventType".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use sqlx::postgres::PgPoolOptions;
    use uuid::Uuid;

    fn service() -> Arc<TwoFactorService> {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        Arc::new(TwoFactorService::new(pool, "oshinstar".to_string()))
    }

    #[tokio::test]
    async fn missing_payload_is_bad_request() {
        let response = two_factor(Extension(service()), None).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_event_type_is_bad_request() {
        let response = two_factor(
            Extension(service()),
            Some(Json(TwoFactorRequest {
                event_type: "rotate_keys".to_string(),
                client_id: Uuid::new_v4(),
                totp: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validate_without_code_is_bad_request() {
        let response = two_factor(
            Extension(service()),
            Some(Json(TwoFactorRequest {
                event_type: "validate_totp".to_string(),
                client_id: Uuid::new_v4(),
                totp: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn validate_with_unreachable_store_reports_invalid() {
        // The service swallows storage failures to `valid: false`.
        let response = two_factor(
            Extension(service()),
            Some(Json(TwoFactorRequest {
                event_type: "validate_totp".to_string(),
                client_id: Uuid::new_v4(),
                totp: Some("000000".to_string()),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
