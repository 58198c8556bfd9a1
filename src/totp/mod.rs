//! Secret and one-time-code generation plus TOTP validation.
//!
//! Everything here is pure: no database access and no clock state beyond the
//! system time read inside [`verify_code`]. Callers that need determinism use
//! [`verify_code_at`].

use anyhow::{Result, anyhow};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use rand::{Rng, RngCore, rngs::OsRng};
use totp_rs::{Algorithm, Secret, TOTP};

/// Number of digits in a TOTP code.
pub const TOTP_DIGITS: usize = 6;

/// TOTP time step in seconds.
pub const TOTP_PERIOD: u64 = 30;

/// Accepted clock drift, in time steps, on either side of the current step.
pub const TOTP_SKEW: u8 = 1;

/// Generate a new TOTP secret: `byte_length` random bytes from the OS
/// CSPRNG, base32-encoded without padding.
#[must_use]
pub fn generate_secret(byte_length: usize) -> String {
    let mut bytes = vec![0u8; byte_length];
    OsRng.fill_bytes(&mut bytes);
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, &bytes)
}

/// Generate a fixed-length decimal verification code.
#[must_use]
pub fn numeric_code(digits: u32) -> String {
    let upper = 10u64.pow(digits);
    let code = OsRng.gen_range(0..upper);
    format!("{code:0width$}", width = digits as usize)
}

/// Generate a fixed-length code over the `1..=9` digit alphabet, the form
/// used for email verification.
#[must_use]
pub fn email_code(length: usize) -> String {
    const ALPHABET: &[u8] = b"123456789";
    (0..length)
        .map(|_| ALPHABET[OsRng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Build an `otpauth://totp/...` provisioning URI for authenticator apps.
///
/// Issuer and account label are percent-encoded; the secret is emitted as-is
/// (base32 is URI-safe).
#[must_use]
pub fn provisioning_uri(issuer: &str, account: &str, secret: &str) -> String {
    let issuer_enc = utf8_percent_encode(issuer, NON_ALPHANUMERIC);
    let account_enc = utf8_percent_encode(account, NON_ALPHANUMERIC);
    format!(
        "otpauth://totp/{issuer_enc}:{account_enc}?secret={secret}&issuer={issuer_enc}&algorithm=SHA1&digits={TOTP_DIGITS}&period={TOTP_PERIOD}"
    )
}

/// Check a submitted code against a stored base32 secret at the current time,
/// tolerating [`TOTP_SKEW`] steps of clock drift on either side.
///
/// # Errors
/// Returns an error if the stored secret is not valid base32. A wrong code is
/// `Ok(false)`, never an error.
pub fn verify_code(secret: &str, code: &str) -> Result<bool> {
    let totp = build_totp(secret)?;
    totp.check_current(code)
        .map_err(|e| anyhow!("system time error during TOTP check: {e}"))
}

/// Check a submitted code at a fixed unix timestamp. Used by tests and any
/// caller that injects its own clock.
///
/// # Errors
/// Returns an error if the stored secret is not valid base32.
pub fn verify_code_at(secret: &str, code: &str, unix_time: u64) -> Result<bool> {
    let totp = build_totp(secret)?;
    Ok(totp.check(code, unix_time))
}

/// Generate the code for a secret at a fixed timestamp. Test helper.
///
/// # Errors
/// Returns an error if the secret is not valid base32.
pub fn generate_code_at(secret: &str, unix_time: u64) -> Result<String> {
    let totp = build_totp(secret)?;
    Ok(totp.generate(unix_time))
}

fn build_totp(secret: &str) -> Result<TOTP> {
    let bytes = Secret::Encoded(secret.to_string())
        .to_bytes()
        .map_err(|e| anyhow!("TOTP secret is not valid base32: {e:?}"))?;
    TOTP::new(Algorithm::SHA1, TOTP_DIGITS, TOTP_SKEW, TOTP_PERIOD, bytes)
        .map_err(|e| anyhow!("failed to initialize TOTP: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_is_unpadded_base32() {
        let secret = generate_secret(20);
        // 20 bytes -> 32 base32 chars, no '=' padding
        assert_eq!(secret.len(), 32);
        assert!(!secret.contains('='));
        assert!(
            base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &secret).is_some(),
            "secret should round-trip through base32"
        );
    }

    #[test]
    fn generated_secrets_differ() {
        assert_ne!(generate_secret(20), generate_secret(20));
    }

    #[test]
    fn numeric_code_has_fixed_width() {
        for _ in 0..50 {
            let code = numeric_code(6);
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn email_code_uses_digit_alphabet() {
        for _ in 0..50 {
            let code = email_code(6);
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| ('1'..='9').contains(&c)));
        }
    }

    #[test]
    fn provisioning_uri_encodes_label() {
        let uri = provisioning_uri("oshinstar", "user@example.com", "JBSWY3DPEHPK3PXP");
        assert!(uri.starts_with("otpauth://totp/oshinstar:user%40example%2Ecom?"));
        assert!(uri.contains("secret=JBSWY3DPEHPK3PXP"));
        assert!(uri.contains("issuer=oshinstar"));
        assert!(uri.contains("algorithm=SHA1"));
        assert!(uri.contains("digits=6"));
        assert!(uri.contains("period=30"));
    }

    #[test]
    fn code_from_same_secret_verifies() -> anyhow::Result<()> {
        let secret = generate_secret(20);
        let now = 1_700_000_000;
        let code = generate_code_at(&secret, now)?;
        assert!(verify_code_at(&secret, &code, now)?);
        Ok(())
    }

    #[test]
    fn code_from_other_secret_fails() -> anyhow::Result<()> {
        let secret = generate_secret(20);
        let other = generate_secret(20);
        let now = 1_700_000_000;
        let code = generate_code_at(&other, now)?;
        assert!(!verify_code_at(&secret, &code, now)?);
        Ok(())
    }

    #[test]
    fn drift_of_one_step_is_tolerated() -> anyhow::Result<()> {
        let secret = generate_secret(20);
        let now = 1_700_000_000;
        let past = generate_code_at(&secret, now - TOTP_PERIOD)?;
        let future = generate_code_at(&secret, now + TOTP_PERIOD)?;
        assert!(verify_code_at(&secret, &past, now)?);
        assert!(verify_code_at(&secret, &future, now)?);
        Ok(())
    }

    #[test]
    fn drift_of_two_steps_is_rejected() -> anyhow::Result<()> {
        let secret = generate_secret(20);
        let now = 1_700_000_000;
        let stale = generate_code_at(&secret, now - 2 * TOTP_PERIOD)?;
        assert!(!verify_code_at(&secret, &stale, now)?);
        Ok(())
    }

    #[test]
    fn malformed_secret_is_an_error() {
        assert!(verify_code_at("not base32!!", "000000", 1_700_000_000).is_err());
    }
}
