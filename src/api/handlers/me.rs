//! Current-user endpoint, gated by the access token.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::ToSchema;

use super::types::UserResponse;
use super::{error_response, extract_bearer_token};
use crate::auth::{AuthError, TokenService};
use crate::store;

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub user: UserResponse,
}

#[utoipa::path(
    get,
    path = "/v1/user/me",
    responses(
        (status = 200, description = "User details", body = MeResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Server error")
    ),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    tokens: Extension<Arc<TokenService>>,
) -> impl IntoResponse {
    let Some(token) = extract_bearer_token(&headers) else {
        return (StatusCode::UNAUTHORIZED, "No token provided".to_string()).into_response();
    };

    let claims = match tokens.verify(token) {
        Ok(claims) => claims,
        Err(err) => return error_response(&err),
    };

    match store::find_user_by_id(&pool, claims.sub).await {
        Ok(Some(user)) => (StatusCode::OK, Json(MeResponse { user: user.into() })).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "User not found".to_string()).into_response(),
        Err(err) => error_response(&AuthError::Internal(err)),
    }
}
