//! Outbound delivery abstractions for SMS, voice calls, and email.
//!
//! The verification flows talk to a [`Notifier`] rather than a concrete
//! provider. The default for local development is [`LogNotifier`], which logs
//! the payload and returns `Ok(())`; production wiring uses
//! [`twilio::TwilioNotifier`], which delivers SMS and voice through the
//! Twilio REST API and email through SendGrid.

pub mod twilio;

pub use twilio::{TwilioConfig, TwilioNotifier};

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

/// Delivery capability consumed by the verification flows.
///
/// Implementations deliver the message or return an error; callers decide how
/// a failed delivery maps to their own error taxonomy. No state is mutated on
/// the caller side until delivery has succeeded.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a text message.
    async fn send_sms(&self, to: &str, body: &str) -> Result<()>;

    /// Place a voice call that reads `script` to the callee.
    async fn place_call(&self, to: &str, script: &str) -> Result<()>;

    /// Send an HTML email.
    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

/// Local dev notifier that logs instead of delivering.
#[derive(Clone, Debug)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_sms(&self, to: &str, body: &str) -> Result<()> {
        info!(to = %to, body = %body, "sms send stub");
        Ok(())
    }

    async fn place_call(&self, to: &str, script: &str) -> Result<()> {
        info!(to = %to, script = %script, "voice call stub");
        Ok(())
    }

    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        info!(to = %to, subject = %subject, html_len = html.len(), "email send stub");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_always_succeeds() -> Result<()> {
        let notifier = LogNotifier;
        notifier.send_sms("+15550001111", "code 123456").await?;
        notifier.place_call("+15550001111", "1 2 3 4 5 6").await?;
        notifier
            .send_email("user@example.com", "Verify", "<p>123456</p>")
            .await?;
        Ok(())
    }
}
