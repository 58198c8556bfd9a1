//! User creation, lookup, and one-time profile mutations.

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use super::types::{
    BirthdateResponse, CreateUserRequest, CreatedUserResponse, EmailExistsRequest,
    UpdateBirthdateRequest, UpdatePasswordRequest, UserResponse,
};
use super::{error_response, missing_payload};
use crate::auth::{AuthError, TokenService, password};
use crate::store::{self, CreateUser, SignupOutcome, UserPatch};

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[utoipa::path(
    post,
    path = "/v1/user",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Existing user updated", body = UserResponse),
        (status = 201, description = "User created", body = CreatedUserResponse),
        (status = 400, description = "Missing email"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already exists"),
        (status = 500, description = "Server error")
    ),
    tag = "signup"
)]
pub async fn create_user(
    pool: Extension<PgPool>,
    tokens: Extension<Arc<TokenService>>,
    payload: Option<Json<CreateUserRequest>>,
) -> impl IntoResponse {
    let request: CreateUserRequest = match payload {
        Some(Json(payload)) => payload,
        None => return missing_payload(),
    };

    match request.user_id {
        Some(user_id) => update_existing(&pool, user_id, request).await,
        None => create_new(&pool, &tokens, request).await,
    }
}

async fn create_new(
    pool: &PgPool,
    tokens: &TokenService,
    request: CreateUserRequest,
) -> axum::response::Response {
    let Some(email) = request.email.filter(|email| !email.trim().is_empty()) else {
        return error_response(&AuthError::BadRequest(
            "Email is required to create a new user".to_string(),
        ));
    };

    if !super::valid_email(&email) {
        return error_response(&AuthError::BadRequest("Invalid email".to_string()));
    }

    let password_hash = match request.password.as_deref().map(password::hash).transpose() {
        Ok(hash) => hash,
        Err(err) => return error_response(&AuthError::Internal(err)),
    };

    let username = match (&request.first_name, &request.last_name) {
        (Some(first), Some(last)) => match generate_unique_username(pool, first, last).await {
            Ok(username) => Some(username),
            Err(err) => return error_response(&AuthError::Internal(err)),
        },
        _ => None,
    };

    let new_user = CreateUser {
        email,
        password_hash,
        first_name: request.first_name,
        last_name: request.last_name,
        username,
        gender: request.gender,
        birthdate: request.birthdate,
        phone: request.phone,
        location: request.location,
        categories: request.categories.unwrap_or_default(),
        account_type: request.account_type,
        is_phone_verified: request.is_phone_verified.unwrap_or(false),
        is_email_verified: request.is_email_verified.unwrap_or(false),
    };

    match store::insert_user(pool, new_user).await {
        Ok(SignupOutcome::Created(user)) => match tokens.issue(user.id, &user.email) {
            Ok(pair) => {
                let response = CreatedUserResponse {
                    token: pair.access,
                    user: user.into(),
                };
                (StatusCode::CREATED, Json(response)).into_response()
            }
            Err(err) => error_response(&err),
        },
        Ok(SignupOutcome::Conflict) => {
            (StatusCode::CONFLICT, "Email already exists".to_string()).into_response()
        }
        Err(err) => error_response(&AuthError::Internal(err)),
    }
}

async fn update_existing(
    pool: &PgPool,
    user_id: Uuid,
    request: CreateUserRequest,
) -> axum::response::Response {
    let password_hash = match request.password.as_deref().map(password::hash).transpose() {
        Ok(hash) => hash,
        Err(err) => return error_response(&AuthError::Internal(err)),
    };

    // A changed name regenerates the unique username, as on creation.
    let username = match (&request.first_name, &request.last_name) {
        (Some(first), Some(last)) => match generate_unique_username(pool, first, last).await {
            Ok(username) => Some(username),
            Err(err) => return error_response(&AuthError::Internal(err)),
        },
        _ => None,
    };

    let patch = UserPatch {
        email: request.email,
        password_hash,
        first_name: request.first_name,
        last_name: request.last_name,
        username,
        gender: request.gender,
        birthdate: request.birthdate,
        phone: request.phone,
        location: request.location,
        categories: request.categories,
        account_type: request.account_type,
        is_phone_verified: request.is_phone_verified,
        is_email_verified: request.is_email_verified,
    };

    match store::update_user(pool, user_id, patch).await {
        Ok(Some(user)) => {
            (StatusCode::OK, Json(UserResponse::from(user))).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "User not found".to_string()).into_response(),
        Err(err) => error_response(&AuthError::Internal(err)),
    }
}

/// Derive `first.last`, appending a counter until the username is free.
async fn generate_unique_username(
    pool: &PgPool,
    first_name: &str,
    last_name: &str,
) -> anyhow::Result<String> {
    let base = format!(
        "{}.{}",
        first_name.trim().to_lowercase(),
        last_name.trim().to_lowercase()
    );
    let mut candidate = base.clone();
    let mut counter = 1u32;

    while store::username_exists(pool, &candidate).await? {
        candidate = format!("{base}{counter}");
        counter += 1;
    }

    Ok(candidate)
}

#[utoipa::path(
    post,
    path = "/v1/user/email_exists",
    request_body = EmailExistsRequest,
    responses(
        (status = 200, description = "Email exists"),
        (status = 404, description = "Email does not exist"),
        (status = 500, description = "Server error")
    ),
    tag = "signup"
)]
pub async fn email_exists(
    pool: Extension<PgPool>,
    payload: Option<Json<EmailExistsRequest>>,
) -> impl IntoResponse {
    let request: EmailExistsRequest = match payload {
        Some(Json(payload)) => payload,
        None => return missing_payload(),
    };

    match store::email_exists(&pool, &request.email).await {
        Ok(true) => (StatusCode::OK, Json(json!({}))).into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
        Err(err) => error_response(&AuthError::Internal(err)),
    }
}

#[utoipa::path(
    get,
    path = "/v1/user/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "The user's id")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 500, description = "Server error")
    ),
    tag = "signup"
)]
pub async fn get_user(pool: Extension<PgPool>, Path(user_id): Path<Uuid>) -> impl IntoResponse {
    match store::find_user_by_id(&pool, user_id).await {
        Ok(Some(user)) => (StatusCode::OK, Json(UserResponse::from(user))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "User not found".to_string()).into_response(),
        Err(err) => error_response(&AuthError::Internal(err)),
    }
}

#[utoipa::path(
    post,
    path = "/v3/auth/update_password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated successfully"),
        (status = 400, description = "Missing user id or password"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Server error")
    ),
    tag = "auth"
)]
pub async fn update_password(
    pool: Extension<PgPool>,
    payload: Option<Json<UpdatePasswordRequest>>,
) -> impl IntoResponse {
    let request: UpdatePasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return missing_payload(),
    };

    if request.new_password.is_empty() {
        return error_response(&AuthError::BadRequest(
            "User ID and new password are required".to_string(),
        ));
    }

    let hash = match password::hash(&request.new_password) {
        Ok(hash) => hash,
        Err(err) => return error_response(&AuthError::Internal(err)),
    };

    match store::set_password_hash(&pool, request.user_id, &hash).await {
        Ok(true) => (
            StatusCode::OK,
            Json(json!({ "message": "Password updated successfully" })),
        )
            .into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "User not found".to_string()).into_response(),
        Err(err) => error_response(&AuthError::Internal(err)),
    }
}

#[utoipa::path(
    post,
    path = "/v1/user/update_birthdate",
    request_body = UpdateBirthdateRequest,
    responses(
        (status = 200, description = "Birthdate updated successfully", body = BirthdateResponse),
        (status = 400, description = "Invalid month or birthdate already set"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Server error")
    ),
    tag = "signup"
)]
pub async fn update_birthdate(
    pool: Extension<PgPool>,
    payload: Option<Json<UpdateBirthdateRequest>>,
) -> impl IntoResponse {
    let request: UpdateBirthdateRequest = match payload {
        Some(Json(payload)) => payload,
        None => return missing_payload(),
    };

    let Some(month) = parse_month(&request.month) else {
        return error_response(&AuthError::BadRequest("Invalid month".to_string()));
    };

    let birthdate = format!(
        "{:04}-{month}-{:02}T00:00:00.000Z",
        request.year, request.day
    );

    match store::set_birthdate_once(&pool, request.user_id, &birthdate).await {
        Ok(Some(stored)) => (
            StatusCode::OK,
            Json(BirthdateResponse {
                message: "Birthdate updated successfully".to_string(),
                birthdate: stored,
            }),
        )
            .into_response(),
        // Disambiguate "unknown user" from "already set once".
        Ok(None) => match store::find_user_by_id(&pool, request.user_id).await {
            Ok(Some(_)) => error_response(&AuthError::BadRequest(
                "Birthdate can only be set once".to_string(),
            )),
            Ok(None) => (StatusCode::NOT_FOUND, "User not found".to_string()).into_response(),
            Err(err) => error_response(&AuthError::Internal(err)),
        },
        Err(err) => error_response(&AuthError::Internal(err)),
    }
}

/// Month name to zero-padded month number.
fn parse_month(month: &str) -> Option<String> {
    MONTHS
        .iter()
        .position(|name| name.eq_ignore_ascii_case(month))
        .map(|index| format!("{:02}", index + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenConfig;
    use axum::response::IntoResponse;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    fn token_service() -> Arc<TokenService> {
        Arc::new(TokenService::new(TokenConfig::new(
            SecretString::from("access"),
            SecretString::from("refresh"),
        )))
    }

    #[test]
    fn month_names_parse_to_padded_numbers() {
        assert_eq!(parse_month("January").as_deref(), Some("01"));
        assert_eq!(parse_month("september").as_deref(), Some("09"));
        assert_eq!(parse_month("December").as_deref(), Some("12"));
        assert_eq!(parse_month("Brumaire"), None);
    }

    #[tokio::test]
    async fn create_user_missing_payload_is_bad_request() {
        let response = create_user(Extension(lazy_pool()), Extension(token_service()), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_user_without_email_is_bad_request() {
        let response = create_user(
            Extension(lazy_pool()),
            Extension(token_service()),
            Some(Json(CreateUserRequest {
                user_id: None,
                email: None,
                password: None,
                first_name: None,
                last_name: None,
                gender: None,
                birthdate: None,
                phone: None,
                location: None,
                categories: None,
                is_phone_verified: None,
                is_email_verified: None,
                account_type: None,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_password_rejects_empty_password() {
        let response = update_password(
            Extension(lazy_pool()),
            Some(Json(UpdatePasswordRequest {
                user_id: Uuid::new_v4(),
                new_password: String::new(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_birthdate_rejects_unknown_month() {
        let response = update_birthdate(
            Extension(lazy_pool()),
            Some(Json(UpdateBirthdateRequest {
                user_id: Uuid::new_v4(),
                day: 4,
                month: "Floreal".to_string(),
                year: 2001,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
