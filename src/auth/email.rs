//! Email verification: templated code delivery and single-use validation.
//!
//! Identity is keyed on the user id throughout: the submitted address must
//! match the stored one (compared case-insensitively) before anything is
//! sent, and a mismatch is a client error rather than a silent no-op. Codes
//! expire after 24 hours, matching the validity window promised in the
//! message copy, and are cleared on successful validation.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use super::error::AuthError;
use crate::{notify::Notifier, store, totp};

const CODE_LENGTH: usize = 6;
const SUBJECT: &str = "Action Required! Confirm your Oshinstar Account";

/// Link base and sender identity for verification emails.
#[derive(Clone, Debug)]
pub struct EmailConfig {
    verify_base_url: String,
}

impl EmailConfig {
    #[must_use]
    pub fn new(verify_base_url: String) -> Self {
        Self { verify_base_url }
    }
}

pub struct EmailVerificationService {
    pool: PgPool,
    notifier: Arc<dyn Notifier>,
    config: EmailConfig,
}

impl EmailVerificationService {
    #[must_use]
    pub fn new(pool: PgPool, notifier: Arc<dyn Notifier>, config: EmailConfig) -> Self {
        Self {
            pool,
            notifier,
            config,
        }
    }

    /// Generate a verification code, email it to the user's address, and
    /// persist it for later validation.
    ///
    /// # Errors
    /// - [`AuthError::BadRequest`] for an unknown user or an address that
    ///   does not match the stored one
    /// - [`AuthError::Delivery`] when the notifier fails (no code stored)
    pub async fn send_code(&self, user_id: Uuid, email: &str) -> Result<(), AuthError> {
        let user = store::find_user_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AuthError::BadRequest("Unknown user".to_string()))?;

        if !user.email.eq_ignore_ascii_case(email.trim()) {
            return Err(AuthError::BadRequest(
                "Email does not match the account".to_string(),
            ));
        }

        let code = totp::email_code(CODE_LENGTH);
        let html = verification_email_html(&code, &self.verify_url(email, &code));

        self.notifier
            .send_email(email, SUBJECT, &html)
            .await
            .map_err(AuthError::Delivery)?;

        store::set_email_code(&self.pool, user_id, &code).await?;

        Ok(())
    }

    /// Validate a submitted code: one conditional update matching user id and
    /// code within the 24-hour window. Success marks the email verified and
    /// clears the code so it cannot be replayed.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidCode`] when nothing matched.
    pub async fn validate_code(&self, user_id: Uuid, code: &str) -> Result<(), AuthError> {
        if store::consume_email_code(&self.pool, user_id, code).await? {
            Ok(())
        } else {
            Err(AuthError::InvalidCode)
        }
    }

    fn verify_url(&self, email: &str, code: &str) -> String {
        let base = self.config.verify_base_url.trim_end_matches('/');
        format!("{base}/{email}/{code}")
    }
}

/// Render the verification message: the code in large type plus a
/// confirmation button embedding the same code.
#[must_use]
pub fn verification_email_html(code: &str, verify_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Verify Email</title>
</head>
<body>
  <p>Action required: confirm your Oshinstar account</p>
  <p>Hello, <br/><br/>You recently signed up for Oshinstar. To complete the registration process, please confirm your account.</p>
  <p><strong>{code}</strong></p>
  <p>Enter this code or click on the button below.</p>
  <a href="{verify_url}" style="display:inline-block; padding:10px 20px; color:#fff; background-color:#3AAEE0; text-decoration:none;">Click here to confirm your account</a>
  <p>Important: this code or link are valid for 24 hours, later you have to generate it again.</p>
  <p>Oshinstar helps you communicate and stay in touch with all your friends. Once you sign up for Oshinstar, you can share video, plan events and much more.</p>
</body>
</html>
"#
    )
}
