//! Database access for account and verification state.
//!
//! All persisted state lives in two tables: `users` (identity, profile and
//! auth flags) and `phone_codes` (at most one outstanding phone verification
//! code per user). Nothing outside this module issues queries; counters that
//! race under concurrent requests (phone-send attempts, email-code
//! consumption) are updated with single conditional statements rather than
//! read-modify-write.

mod phone;
mod users;

pub use phone::{consume_phone_code, upsert_phone_code};
pub use users::{
    CreateUser, SignupOutcome, UserPatch, consume_email_code, email_exists, find_user_by_email,
    find_user_by_id, increment_phone_attempts, insert_user, set_birthdate_once, set_email_code,
    set_has_two_factor, set_password_hash, set_secret_key, update_user, username_exists,
};

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

/// A full user record as stored. Sensitive columns (`password_hash`,
/// `secret_key`, `email_code`) never leave the crate; API responses are built
/// from the public subset.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: Uuid,
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
    pub member_since: Option<NaiveDate>,
    pub is_phone_verified: bool,
    pub is_email_verified: bool,
    pub attempts: i32,
    pub can_update_phone_code: bool,
    pub can_update_birthdate: bool,
    pub secret_key: Option<String>,
    pub has_two_factor: bool,
    pub email_code: Option<String>,
    pub email_code_sent_at: Option<DateTime<Utc>>,
}

pub(crate) const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, username, \
     gender, birthdate, phone, location, categories, account_type, member_since, \
     is_phone_verified, is_email_verified, attempts, can_update_phone_code, \
     can_update_birthdate, secret_key, has_two_factor, email_code, email_code_sent_at";

pub(crate) fn user_from_row(row: &PgRow) -> UserRecord {
    UserRecord {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        first_name: row.get("first_name"),
        last_name: row.get("last_name"),
        username: row.get("username"),
        gender: row.get("gender"),
        birthdate: row.get("birthdate"),
        phone: row.get("phone"),
        location: row.get("location"),
        categories: row.get("categories"),
        account_type: row.get("account_type"),
        member_since: row.get("member_since"),
        is_phone_verified: row.get("is_phone_verified"),
        is_email_verified: row.get("is_email_verified"),
        attempts: row.get("attempts"),
        can_update_phone_code: row.get("can_update_phone_code"),
        can_update_birthdate: row.get("can_update_birthdate"),
        secret_key: row.get("secret_key"),
        has_two_factor: row.get("has_two_factor"),
        email_code: row.get("email_code"),
        email_code_sent_at: row.get("email_code_sent_at"),
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
