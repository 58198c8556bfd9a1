//! Twilio-backed notifier: SMS and voice via the Twilio REST API, email via
//! SendGrid. One HTTP client with a bounded timeout serves all three so a
//! slow provider cannot stall a request handler indefinitely.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::time::Duration;

use super::Notifier;
use crate::APP_USER_AGENT;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";
const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Credentials and sender identities for outbound delivery.
#[derive(Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: SecretString,
    pub from_number: String,
    pub sendgrid_api_key: SecretString,
    pub mail_from: String,
}

impl std::fmt::Debug for TwilioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioConfig")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"***")
            .field("from_number", &self.from_number)
            .field("sendgrid_api_key", &"***")
            .field("mail_from", &self.mail_from)
            .finish()
    }
}

pub struct TwilioNotifier {
    client: reqwest::Client,
    config: TwilioConfig,
}

impl TwilioNotifier {
    /// Build a notifier with a bounded-timeout HTTP client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: TwilioConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(DELIVERY_TIMEOUT)
            .build()
            .context("failed to build delivery HTTP client")?;

        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{TWILIO_API_BASE}/Accounts/{}/Messages.json",
            self.config.account_sid
        )
    }

    fn calls_url(&self) -> String {
        format!(
            "{TWILIO_API_BASE}/Accounts/{}/Calls.json",
            self.config.account_sid
        )
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    async fn send_sms(&self, to: &str, body: &str) -> Result<()> {
        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];
        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(&params)
            .send()
            .await
            .context("SMS request failed")?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(anyhow!("SMS delivery rejected: {}", response.status()))
        }
    }

    async fn place_call(&self, to: &str, script: &str) -> Result<()> {
        // Twilio reads inline TwiML when the `Twiml` parameter is set.
        let twiml = format!("<Response><Say>{script}</Say></Response>");
        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Twiml", twiml.as_str()),
        ];
        let response = self
            .client
            .post(self.calls_url())
            .basic_auth(
                &self.config.account_sid,
                Some(self.config.auth_token.expose_secret()),
            )
            .form(&params)
            .send()
            .await
            .context("voice call request failed")?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(anyhow!("voice call rejected: {}", response.status()))
        }
    }

    async fn send_email(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": self.config.mail_from },
            "subject": subject,
            "content": [{ "type": "text/html", "value": html }],
        });
        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(self.config.sendgrid_api_key.expose_secret())
            .json(&payload)
            .send()
            .await
            .context("email request failed")?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(anyhow!("email delivery rejected: {}", response.status()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC00000000000000000000000000000000".to_string(),
            auth_token: SecretString::from("hunter2"),
            from_number: "+13214051396".to_string(),
            sendgrid_api_key: SecretString::from("sg-key"),
            mail_from: "security@oshinstar.com".to_string(),
        }
    }

    #[test]
    fn urls_embed_account_sid() -> Result<()> {
        let notifier = TwilioNotifier::new(config())?;
        assert_eq!(
            notifier.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC00000000000000000000000000000000/Messages.json"
        );
        assert_eq!(
            notifier.calls_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC00000000000000000000000000000000/Calls.json"
        );
        Ok(())
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("sg-key"));
        assert!(rendered.contains("***"));
    }
}
