//! Phone verification: attempt-limited code delivery over SMS or voice.
//!
//! Sends are capped at 3 per user. The counter is incremented with a
//! conditional update after a successful dispatch, so two concurrent sends
//! cannot push an account past the limit, and a failed delivery mutates
//! nothing. Each send replaces the outstanding code; validation consumes it.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use super::error::AuthError;
use crate::{notify::Notifier, store, totp};

const CODE_DIGITS: u32 = 6;
const MAX_ATTEMPTS: i32 = 3;

/// How the code reaches the phone.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeliveryMethod {
    Sms,
    Call,
}

impl DeliveryMethod {
    /// Parse the wire value (`sms` / `call`).
    ///
    /// # Errors
    /// Returns [`AuthError::BadRequest`] for anything else.
    pub fn parse(value: &str) -> Result<Self, AuthError> {
        match value {
            "sms" => Ok(Self::Sms),
            "call" => Ok(Self::Call),
            _ => Err(AuthError::BadRequest(
                "Invalid verification method".to_string(),
            )),
        }
    }
}

pub struct PhoneVerificationService {
    pool: PgPool,
    notifier: Arc<dyn Notifier>,
}

impl PhoneVerificationService {
    #[must_use]
    pub fn new(pool: PgPool, notifier: Arc<dyn Notifier>) -> Self {
        Self { pool, notifier }
    }

    /// Issue a verification code to a phone number.
    ///
    /// # Errors
    /// - [`AuthError::NotFound`] for an unknown user
    /// - [`AuthError::TooManyAttempts`] once the 3-send limit is reached
    /// - [`AuthError::Delivery`] when the notifier fails (no state mutated)
    pub async fn send_code(
        &self,
        user_id: Uuid,
        phone: &str,
        method: DeliveryMethod,
        event_type: Option<&str>,
        app_signature: Option<&str>,
    ) -> Result<(), AuthError> {
        let user = store::find_user_by_id(&self.pool, user_id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if user.attempts >= MAX_ATTEMPTS {
            return Err(AuthError::TooManyAttempts);
        }

        let code = totp::numeric_code(CODE_DIGITS);
        let to = format_phone_number(event_type, phone);

        match method {
            DeliveryMethod::Sms => {
                let body = sms_body(&code, app_signature);
                self.notifier
                    .send_sms(to, &body)
                    .await
                    .map_err(AuthError::Delivery)?;
            }
            DeliveryMethod::Call => {
                let script = spoken_script(&code);
                self.notifier
                    .place_call(to, &script)
                    .await
                    .map_err(AuthError::Delivery)?;
            }
        }

        // The conditional increment is the authoritative gate: when a
        // concurrent send already burned the last attempt, this send loses.
        if store::increment_phone_attempts(&self.pool, user_id)
            .await?
            .is_none()
        {
            return Err(AuthError::TooManyAttempts);
        }

        store::upsert_phone_code(&self.pool, user_id, &code, phone).await?;

        Ok(())
    }

    /// Validate a submitted code. Succeeds exactly once per issued code: the
    /// matching row is deleted, so replays fail.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidCode`] when the code is absent, stale, or
    /// wrong.
    pub async fn validate_code(&self, user_id: Uuid, code: &str) -> Result<(), AuthError> {
        if store::consume_phone_code(&self.pool, user_id, code).await? {
            Ok(())
        } else {
            Err(AuthError::InvalidCode)
        }
    }
}

/// Strip the international-dialing prefix when the triggering event is
/// "set primary phone"; otherwise the number is sent as-is.
#[must_use]
pub fn format_phone_number<'a>(event_type: Option<&str>, phone: &'a str) -> &'a str {
    if event_type == Some("set_primary_phone") {
        phone.split('+').nth(1).unwrap_or(phone)
    } else {
        phone
    }
}

/// Branded SMS body with an optional app-signature suffix (used by mobile
/// clients for automatic code retrieval).
#[must_use]
pub fn sms_body(code: &str, app_signature: Option<&str>) -> String {
    format!(
        "Oshinstar - Your verification code is: {code}\n{}",
        app_signature.unwrap_or_default()
    )
}

/// Voice script: digits pronounced individually and read twice for clarity.
#[must_use]
pub fn spoken_script(code: &str) -> String {
    let spaced = code
        .chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(" ");
    format!("Hello, your Oshinstar verification code is, {spaced}. Your code is, {spaced}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use sqlx::postgres::PgPoolOptions;

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send_sms(&self, _to: &str, _body: &str) -> Result<()> {
            Err(anyhow!("provider down"))
        }

        async fn place_call(&self, _to: &str, _script: &str) -> Result<()> {
            Err(anyhow!("provider down"))
        }

        async fn send_email(&self, _to: &str, _subject: &str, _html: &str) -> Result<()> {
            Err(anyhow!("provider down"))
        }
    }

    #[test]
    fn method_parses_wire_values() {
        assert_eq!(DeliveryMethod::parse("sms").ok(), Some(DeliveryMethod::Sms));
        assert_eq!(
            DeliveryMethod::parse("call").ok(),
            Some(DeliveryMethod::Call)
        );
        assert!(matches!(
            DeliveryMethod::parse("carrier-pigeon"),
            Err(AuthError::BadRequest(_))
        ));
    }

    #[test]
    fn primary_phone_event_strips_dialing_prefix() {
        assert_eq!(
            format_phone_number(Some("set_primary_phone"), "+15550001111"),
            "15550001111"
        );
        assert_eq!(format_phone_number(None, "+15550001111"), "+15550001111");
        assert_eq!(
            format_phone_number(Some("resend"), "+15550001111"),
            "+15550001111"
        );
        // No prefix to strip: send as-is rather than mangling.
        assert_eq!(
            format_phone_number(Some("set_primary_phone"), "5550001111"),
            "5550001111"
        );
    }

    #[test]
    fn sms_body_includes_code_and_signature() {
        let body = sms_body("123456", Some("a1b2c3"));
        assert_eq!(body, "Oshinstar - Your verification code is: 123456\na1b2c3");

        let body = sms_body("123456", None);
        assert_eq!(body, "Oshinstar - Your verification code is: 123456\n");
    }

    #[test]
    fn spoken_script_doubles_the_digits() {
        let script = spoken_script("123456");
        assert_eq!(
            script,
            "Hello, your Oshinstar verification code is, 1 2 3 4 5 6. Your code is, 1 2 3 4 5 6"
        );
    }

    #[tokio::test]
    async fn delivery_failure_propagates() {
        // Unknown user short-circuits before dispatch on a live database; on
        // an unreachable one the store error surfaces as Internal. Either
        // way, send_code must not return Ok.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        let service = PhoneVerificationService::new(pool, Arc::new(FailingNotifier));
        let result = service
            .send_code(Uuid::new_v4(), "+15550001111", DeliveryMethod::Sms, None, None)
            .await;
        assert!(result.is_err());
    }
}
