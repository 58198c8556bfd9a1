//! Phone verification endpoints.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde_json::json;
use std::sync::Arc;

use super::types::{PhoneValidateRequest, PhoneVerificationRequest};
use super::{error_response, missing_payload};
use crate::auth::{DeliveryMethod, PhoneVerificationService};

#[utoipa::path(
    post,
    path = "/v1/phone/verification",
    request_body = PhoneVerificationRequest,
    responses(
        (status = 200, description = "Verification initiated"),
        (status = 400, description = "Invalid verification method"),
        (status = 429, description = "Too many requests"),
        (status = 500, description = "Server error")
    ),
    tag = "signup"
)]
pub async fn send_verification(
    service: Extension<Arc<PhoneVerificationService>>,
    payload: Option<Json<PhoneVerificationRequest>>,
) -> impl IntoResponse {
    let request: PhoneVerificationRequest = match payload {
        Some(Json(payload)) => payload,
        None => return missing_payload(),
    };

    let method = match DeliveryMethod::parse(&request.method) {
        Ok(method) => method,
        Err(err) => return error_response(&err),
    };

    match service
        .send_code(
            request.user_id,
            &request.phone,
            method,
            request.event_type.as_deref(),
            request.app_signature.as_deref(),
        )
        .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({}))).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/v1/phone/validate",
    request_body = PhoneValidateRequest,
    responses(
        (status = 200, description = "Phone verified successfully"),
        (status = 401, description = "Invalid verification code")
    ),
    tag = "signup"
)]
pub async fn validate(
    service: Extension<Arc<PhoneVerificationService>>,
    payload: Option<Json<PhoneValidateRequest>>,
) -> impl IntoResponse {
    let request: PhoneValidateRequest = match payload {
        Some(Json(payload)) => payload,
        None => return missing_payload(),
    };

    match service.validate_code(request.user_id, &request.code).await {
        Ok(()) => (StatusCode::OK, Json(json!({}))).into_response(),
        Err(err) => error_response(&err),
    }
}
