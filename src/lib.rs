//! # Oshinstar Accounts
//!
//! `oshinstar` is the account backend: signup, login, phone and email
//! verification, and TOTP-based two-factor authentication, served as a thin
//! layer of request handlers over Postgres.
//!
//! ## Verification model
//!
//! - **Phone:** a 6-digit code is delivered by SMS or voice call. Sends are
//!   attempt-limited: after 3 sends the account is soft-locked
//!   (`can_update_phone_code = false`) and further sends are rejected. At most
//!   one live code exists per user; re-sending replaces it, and a successful
//!   validation deletes it so a code can never be replayed.
//! - **Email:** a 6-character code is embedded in a templated message and a
//!   confirmation link. Codes are valid for 24 hours and cleared once used.
//! - **Two-factor:** requesting setup stores a fresh base32 secret
//!   (invalidating any previously scanned QR); `has_two_factor` only flips on
//!   after the first successful code validation.
//!
//! ## Sessions
//!
//! Login issues a short-lived access token and a longer-lived refresh token,
//! signed with distinct secrets. The access token gates `GET /v1/user/me`.

pub mod api;
pub mod auth;
pub mod cli;
pub mod notify;
pub mod store;
pub mod totp;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
