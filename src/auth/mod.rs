//! Authentication and verification core.
//!
//! Flow Overview:
//! 1) Login resolves a user by email, compares the password hash, and issues
//!    an access + refresh token pair.
//! 2) Two-factor setup stores a fresh TOTP secret; `has_two_factor` only
//!    flips on after the first successful code validation.
//! 3) Phone and email verification issue out-of-band codes through the
//!    [`crate::notify::Notifier`] capability and validate them against
//!    stored state.
//!
//! Services take their dependencies (pool, notifier, config) explicitly so
//! handlers stay thin and tests can substitute doubles.

pub mod email;
pub mod error;
pub mod password;
pub mod phone;
pub mod token;
pub mod twofactor;

pub use email::{EmailConfig, EmailVerificationService};
pub use error::AuthError;
pub use phone::{DeliveryMethod, PhoneVerificationService};
pub use token::{Claims, TokenConfig, TokenPair, TokenService};
pub use twofactor::{TwoFactorService, TwoFactorSetup};
