use crate::{
    api,
    auth::TokenConfig,
    notify::{LogNotifier, Notifier, TwilioConfig, TwilioNotifier},
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub access_token_secret: SecretString,
    pub refresh_token_secret: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub totp_issuer: String,
    pub frontend_base_url: String,
    pub email_verify_base_url: String,
    pub twilio: Option<TwilioConfig>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the notifier cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let token_config = TokenConfig::new(args.access_token_secret, args.refresh_token_secret)
        .with_access_ttl_seconds(args.access_token_ttl_seconds)
        .with_refresh_ttl_seconds(args.refresh_token_ttl_seconds);

    let notifier: Arc<dyn Notifier> = match args.twilio {
        Some(config) => Arc::new(TwilioNotifier::new(config)?),
        None => {
            warn!("no delivery credentials configured; codes will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let config = api::ServerConfig {
        frontend_base_url: args.frontend_base_url,
        totp_issuer: args.totp_issuer,
        email_verify_base_url: args.email_verify_base_url,
    };

    api::new(args.port, args.dsn, config, token_config, notifier).await
}
