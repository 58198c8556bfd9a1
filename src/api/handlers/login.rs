//! Login and token refresh.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::types::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};
use super::{error_response, missing_payload};
use crate::auth::{AuthError, TokenService, password};
use crate::store;

#[utoipa::path(
    post,
    path = "/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 500, description = "Server error")
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    tokens: Extension<Arc<TokenService>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return missing_payload(),
    };

    // Email is compared exactly as stored; no normalization on login.
    let user = match store::find_user_by_email(&pool, &request.email).await {
        Ok(user) => user,
        Err(err) => return error_response(&AuthError::Internal(err)),
    };

    let Some(user) = user else {
        return error_response(&AuthError::InvalidCredential);
    };

    let password_ok = user
        .password_hash
        .as_deref()
        .is_some_and(|hash| password::verify(&request.password, hash));
    if !password_ok {
        return error_response(&AuthError::InvalidCredential);
    }

    match tokens.issue(user.id, &user.email) {
        Ok(pair) => {
            let response = LoginResponse {
                token: pair.access,
                refresh_token: pair.refresh,
                user: user.into(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/v1/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed successfully", body = RefreshResponse),
        (status = 401, description = "Failed to authenticate token"),
        (status = 500, description = "Server error")
    ),
    tag = "auth"
)]
pub async fn refresh(
    tokens: Extension<Arc<TokenService>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let request: RefreshRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return (StatusCode::UNAUTHORIZED, "No token provided".to_string()).into_response();
        }
    };

    if request.token.trim().is_empty() {
        return (StatusCode::UNAUTHORIZED, "No token provided".to_string()).into_response();
    }

    match tokens.refresh(&request.token) {
        Ok(token) => (StatusCode::OK, Json(RefreshResponse { token })).into_response(),
        Err(err @ AuthError::TokenInvalid) => error_response(&err),
        Err(err) => {
            error!("failed to refresh token: {err}");
            error_response(&err)
        }
    }
}
