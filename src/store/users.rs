//! Queries over the `users` table.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::{USER_COLUMNS, UserRecord, is_unique_violation, user_from_row};

/// Outcome when attempting to create a new user.
#[derive(Debug)]
pub enum SignupOutcome {
    Created(UserRecord),
    Conflict,
}

/// Fields accepted when creating a user.
#[derive(Debug, Default)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub categories: Vec<String>,
    pub account_type: Option<String>,
    pub is_phone_verified: bool,
    pub is_email_verified: bool,
}

/// Partial update applied to an existing user; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub categories: Option<Vec<String>>,
    pub account_type: Option<String>,
    pub is_phone_verified: Option<bool>,
    pub is_email_verified: Option<bool>,
}

/// Look up a user by email, compared exactly as stored.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up user by email")?;

    Ok(row.as_ref().map(user_from_row))
}

/// Look up a user by id.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn find_user_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<UserRecord>> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to look up user by id")?;

    Ok(row.as_ref().map(user_from_row))
}

/// Check whether an email is already registered.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool> {
    let query = "SELECT 1 FROM users WHERE email = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check email existence")?;

    Ok(row.is_some())
}

/// Check whether a username is taken.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool> {
    let query = "SELECT 1 FROM users WHERE username = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check username existence")?;

    Ok(row.is_some())
}

/// Insert a new user. The id is generated here and is immutable afterwards;
/// `member_since` is stamped with the current date.
///
/// # Errors
/// Returns an error if the insert fails for any reason other than a
/// duplicate email, which maps to [`SignupOutcome::Conflict`].
pub async fn insert_user(pool: &PgPool, new_user: CreateUser) -> Result<SignupOutcome> {
    let query = format!(
        r"
        INSERT INTO users
            (id, email, password_hash, first_name, last_name, username, gender,
             birthdate, phone, location, categories, account_type, member_since,
             is_phone_verified, is_email_verified)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING {USER_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(&new_user.username)
        .bind(&new_user.gender)
        .bind(&new_user.birthdate)
        .bind(&new_user.phone)
        .bind(&new_user.location)
        .bind(&new_user.categories)
        .bind(&new_user.account_type)
        .bind(Utc::now().date_naive())
        .bind(new_user.is_phone_verified)
        .bind(new_user.is_email_verified)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(row) => Ok(SignupOutcome::Created(user_from_row(&row))),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert user"),
    }
}

/// Apply a partial profile update, keeping stored values where the patch is
/// `None`. Returns the updated record, or `None` when the user is unknown.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn update_user(
    pool: &PgPool,
    user_id: Uuid,
    patch: UserPatch,
) -> Result<Option<UserRecord>> {
    let query = format!(
        r"
        UPDATE users SET
            email = COALESCE($2, email),
            password_hash = COALESCE($3, password_hash),
            first_name = COALESCE($4, first_name),
            last_name = COALESCE($5, last_name),
            username = COALESCE($6, username),
            gender = COALESCE($7, gender),
            birthdate = COALESCE($8, birthdate),
            phone = COALESCE($9, phone),
            location = COALESCE($10, location),
            categories = COALESCE($11, categories),
            account_type = COALESCE($12, account_type),
            is_phone_verified = COALESCE($13, is_phone_verified),
            is_email_verified = COALESCE($14, is_email_verified)
        WHERE id = $1
        RETURNING {USER_COLUMNS}
    "
    );
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(user_id)
        .bind(&patch.email)
        .bind(&patch.password_hash)
        .bind(&patch.first_name)
        .bind(&patch.last_name)
        .bind(&patch.username)
        .bind(&patch.gender)
        .bind(&patch.birthdate)
        .bind(&patch.phone)
        .bind(&patch.location)
        .bind(&patch.categories)
        .bind(&patch.account_type)
        .bind(patch.is_phone_verified)
        .bind(patch.is_email_verified)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update user")?;

    Ok(row.as_ref().map(user_from_row))
}

/// Replace a user's password hash. Returns false when the user is unknown.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn set_password_hash(pool: &PgPool, user_id: Uuid, hash: &str) -> Result<bool> {
    let query = "UPDATE users SET password_hash = $2 WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(hash)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update password hash")?;

    Ok(result.rows_affected() > 0)
}

/// Store a freshly generated TOTP secret, overwriting any prior one. Returns
/// false when the user is unknown.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn set_secret_key(pool: &PgPool, user_id: Uuid, secret: &str) -> Result<bool> {
    let query = "UPDATE users SET secret_key = $2 WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(secret)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store TOTP secret")?;

    Ok(result.rows_affected() > 0)
}

/// Flip the two-factor flag. The secret is retained on disable so a user can
/// re-validate without re-scanning.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn set_has_two_factor(pool: &PgPool, user_id: Uuid, enabled: bool) -> Result<()> {
    let query = "UPDATE users SET has_two_factor = $2 WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(user_id)
        .bind(enabled)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update two-factor flag")?;

    Ok(())
}

/// Atomically increment the phone-send attempts counter, locking the account
/// once it reaches 3. The `attempts < 3` guard makes concurrent sends race
/// safely: only rows still under the limit are incremented.
///
/// Returns the new counter value, or `None` when the account is already at
/// the limit.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn increment_phone_attempts(pool: &PgPool, user_id: Uuid) -> Result<Option<i32>> {
    let query = r"
        UPDATE users
        SET attempts = attempts + 1,
            can_update_phone_code = (attempts + 1 < 3)
        WHERE id = $1 AND attempts < 3
        RETURNING attempts
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to increment phone attempts")?;

    Ok(row.map(|row| row.get("attempts")))
}

/// Store an outstanding email verification code with its issuance time.
/// Returns false when the user is unknown.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn set_email_code(pool: &PgPool, user_id: Uuid, code: &str) -> Result<bool> {
    let query = "UPDATE users SET email_code = $2, email_code_sent_at = NOW() WHERE id = $1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(code)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store email code")?;

    Ok(result.rows_affected() > 0)
}

/// Consume an email verification code: a single conditional update that
/// requires id and code to match and the code to be under 24 hours old, marks
/// the email verified, and clears the code so it cannot be replayed.
///
/// Returns false when nothing matched.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn consume_email_code(pool: &PgPool, user_id: Uuid, code: &str) -> Result<bool> {
    let query = r"
        UPDATE users
        SET is_email_verified = TRUE,
            email_code = NULL,
            email_code_sent_at = NULL
        WHERE id = $1
          AND email_code = $2
          AND email_code_sent_at > NOW() - INTERVAL '24 hours'
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(user_id)
        .bind(code)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to consume email code")?;

    Ok(result.rows_affected() > 0)
}

/// One-time birthdate update: only succeeds while `can_update_birthdate` is
/// still true, and clears the flag in the same statement.
///
/// Returns the stored birthdate on success, `None` when the user is unknown
/// or the birthdate was already set.
///
/// # Errors
/// Returns an error if the update fails.
pub async fn set_birthdate_once(
    pool: &PgPool,
    user_id: Uuid,
    birthdate: &str,
) -> Result<Option<String>> {
    let query = r"
        UPDATE users
        SET birthdate = $2, can_update_birthdate = FALSE
        WHERE id = $1 AND can_update_birthdate
        RETURNING birthdate
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(user_id)
        .bind(birthdate)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update birthdate")?;

    Ok(row.map(|row| row.get("birthdate")))
}
