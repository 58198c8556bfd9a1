//! Access and refresh token issuance.
//!
//! Two HS256 JWTs signed with distinct secrets: a short-lived access token
//! that gates authenticated routes, and a longer-lived refresh token that can
//! only mint new access tokens. Claims carry the user id and email.

use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;

const DEFAULT_ACCESS_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Claims carried by both token kinds.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token pair returned on login.
#[derive(Debug)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signing secrets and lifetimes, threaded in at construction rather than
/// read from the environment ad hoc.
#[derive(Clone)]
pub struct TokenConfig {
    access_secret: SecretString,
    refresh_secret: SecretString,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenConfig {
    #[must_use]
    pub fn new(access_secret: SecretString, refresh_secret: SecretString) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }
}

/// Mints and validates session tokens.
#[derive(Clone)]
pub struct TokenService {
    config: TokenConfig,
}

impl TokenService {
    #[must_use]
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }

    /// Issue an access + refresh token pair for a user.
    ///
    /// # Errors
    /// Returns [`AuthError::Internal`] if signing fails.
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<TokenPair, AuthError> {
        let access = self.sign(
            user_id,
            email,
            self.config.access_ttl_seconds,
            &self.config.access_secret,
        )?;
        let refresh = self.sign(
            user_id,
            email,
            self.config.refresh_ttl_seconds,
            &self.config.refresh_secret,
        )?;
        Ok(TokenPair { access, refresh })
    }

    /// Exchange a valid refresh token for a new access token carrying the
    /// same claims.
    ///
    /// # Errors
    /// Returns [`AuthError::TokenInvalid`] for an expired or malformed
    /// refresh token.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = Self::decode_with(refresh_token, &self.config.refresh_secret)?;
        self.sign(
            claims.sub,
            &claims.email,
            self.config.access_ttl_seconds,
            &self.config.access_secret,
        )
    }

    /// Validate an access token and return its claims. Used as the inbound
    /// bearer gate.
    ///
    /// # Errors
    /// Returns [`AuthError::TokenInvalid`] for an expired or malformed token.
    pub fn verify(&self, access_token: &str) -> Result<Claims, AuthError> {
        Self::decode_with(access_token, &self.config.access_secret)
    }

    fn sign(
        &self,
        user_id: Uuid,
        email: &str,
        ttl_seconds: i64,
        secret: &SecretString,
    ) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            iat: now,
            exp: now + ttl_seconds,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
        )
        .map_err(|e| AuthError::Internal(anyhow::anyhow!("token signing failed: {e}")))
    }

    fn decode_with(token: &str, secret: &SecretString) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::TokenInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(TokenConfig::new(
            SecretString::from("access-secret"),
            SecretString::from("refresh-secret"),
        ))
    }

    #[test]
    fn issue_and_verify_round_trip() -> Result<(), AuthError> {
        let service = service();
        let user_id = Uuid::new_v4();
        let pair = service.issue(user_id, "alice@example.com")?;

        let claims = service.verify(&pair.access)?;
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "alice@example.com");
        Ok(())
    }

    #[test]
    fn refresh_preserves_claims() -> Result<(), AuthError> {
        let service = service();
        let user_id = Uuid::new_v4();
        let pair = service.issue(user_id, "alice@example.com")?;

        let new_access = service.refresh(&pair.refresh)?;
        let claims = service.verify(&new_access)?;
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "alice@example.com");
        Ok(())
    }

    #[test]
    fn access_token_is_not_a_refresh_token() {
        let service = service();
        let pair = service
            .issue(Uuid::new_v4(), "alice@example.com")
            .expect("issue");

        // Distinct secrets: an access token must not pass the refresh gate.
        assert!(matches!(
            service.refresh(&pair.access),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let service = service();
        let pair = service
            .issue(Uuid::new_v4(), "alice@example.com")
            .expect("issue");

        let mut tampered = pair.access;
        tampered.pop();
        assert!(matches!(
            service.verify(&tampered),
            Err(AuthError::TokenInvalid)
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let service = service();
        assert!(matches!(
            service.verify("not-a-jwt"),
            Err(AuthError::TokenInvalid)
        ));
    }
}
