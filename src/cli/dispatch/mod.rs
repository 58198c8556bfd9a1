//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{auth, notifier};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;
    let twilio = notifier::parse(matches);

    Ok(Action::Server(Args {
        port,
        dsn,
        access_token_secret: auth_opts.access_token_secret,
        refresh_token_secret: auth_opts.refresh_token_secret,
        access_token_ttl_seconds: auth_opts.access_token_ttl_seconds,
        refresh_token_ttl_seconds: auth_opts.refresh_token_ttl_seconds,
        totp_issuer: auth_opts.totp_issuer,
        frontend_base_url: auth_opts.frontend_base_url,
        email_verify_base_url: auth_opts.email_verify_base_url,
        twilio,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_secret_required() {
        temp_env::with_vars(
            [
                ("OSHINSTAR_ACCESS_TOKEN_SECRET", None::<&str>),
                ("OSHINSTAR_REFRESH_TOKEN_SECRET", Some("refresh")),
                (
                    "OSHINSTAR_DSN",
                    Some("postgres://user@localhost:5432/oshinstar"),
                ),
            ],
            || {
                let command = crate::cli::commands::new();
                let result = command.try_get_matches_from(vec!["oshinstar"]);
                // clap enforces the secret before dispatch is reached
                assert_eq!(
                    result.map(|_| ()).map_err(|e| e.kind()),
                    Err(clap::error::ErrorKind::MissingRequiredArgument)
                );
            },
        );
    }

    #[test]
    fn handler_builds_server_action() -> Result<()> {
        temp_env::with_vars(
            [
                ("OSHINSTAR_TWILIO_ACCOUNT_SID", None::<&str>),
                ("OSHINSTAR_TWILIO_AUTH_TOKEN", None::<&str>),
                ("OSHINSTAR_SENDGRID_API_KEY", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec![
                    "oshinstar",
                    "--port",
                    "9000",
                    "--dsn",
                    "postgres://user@localhost:5432/oshinstar",
                    "--access-token-secret",
                    "a",
                    "--refresh-token-secret",
                    "r",
                ]);
                let Action::Server(args) = handler(&matches)?;
                assert_eq!(args.port, 9000);
                assert_eq!(args.dsn, "postgres://user@localhost:5432/oshinstar");
                assert!(args.twilio.is_none());
                Ok(())
            },
        )
    }
}
