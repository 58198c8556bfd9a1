//! Request/response types for the account endpoints.
//!
//! Wire field names are camelCase to match the public API contract.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::store::UserRecord;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshRequest {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshResponse {
    pub token: String,
}

/// Public view of a user record. Sensitive columns never appear here.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub categories: Vec<String>,
    pub account_type: Option<String>,
    pub member_since: Option<String>,
    pub is_phone_verified: bool,
    pub is_email_verified: bool,
    pub has_two_factor: bool,
    pub can_update_phone_code: bool,
    pub can_update_birthdate: bool,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            user_id: record.id,
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            username: record.username,
            gender: record.gender,
            birthdate: record.birthdate,
            phone: record.phone,
            location: record.location,
            categories: record.categories,
            account_type: record.account_type,
            member_since: record.member_since.map(|date| date.to_string()),
            is_phone_verified: record.is_phone_verified,
            is_email_verified: record.is_email_verified,
            has_two_factor: record.has_two_factor,
            can_update_phone_code: record.can_update_phone_code,
            can_update_birthdate: record.can_update_birthdate,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub categories: Option<Vec<String>>,
    pub is_phone_verified: Option<bool>,
    pub is_email_verified: Option<bool>,
    pub account_type: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUserResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct EmailExistsRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorRequest {
    pub event_type: String,
    pub client_id: Uuid,
    pub totp: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TwoFactorSetupResponse {
    pub link: String,
    pub key: String,
    pub formatted_key: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TotpValidationResponse {
    pub valid: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub user_id: Uuid,
    pub new_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBirthdateRequest {
    pub user_id: Uuid,
    pub day: u32,
    pub month: String,
    pub year: i32,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BirthdateResponse {
    pub message: String,
    pub birthdate: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PhoneVerificationRequest {
    pub user_id: Uuid,
    pub phone: String,
    pub method: String,
    pub event_type: Option<String>,
    pub app_signature: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PhoneValidateRequest {
    pub user_id: Uuid,
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub email: String,
    pub user_id: Uuid,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ValidateEmailRequest {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct StatusResponse {
    pub status: String,
}
