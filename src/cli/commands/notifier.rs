use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

use crate::notify::TwilioConfig;

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("twilio-account-sid")
                .long("twilio-account-sid")
                .help("Twilio account SID for SMS and voice delivery")
                .env("OSHINSTAR_TWILIO_ACCOUNT_SID"),
        )
        .arg(
            Arg::new("twilio-auth-token")
                .long("twilio-auth-token")
                .help("Twilio auth token")
                .env("OSHINSTAR_TWILIO_AUTH_TOKEN"),
        )
        .arg(
            Arg::new("twilio-from-number")
                .long("twilio-from-number")
                .help("Sender phone number for SMS and voice")
                .env("OSHINSTAR_TWILIO_FROM_NUMBER")
                .default_value("+13214051396"),
        )
        .arg(
            Arg::new("sendgrid-api-key")
                .long("sendgrid-api-key")
                .help("SendGrid API key for email delivery")
                .env("OSHINSTAR_SENDGRID_API_KEY"),
        )
        .arg(
            Arg::new("mail-from")
                .long("mail-from")
                .help("Sender address for verification emails")
                .env("OSHINSTAR_MAIL_FROM")
                .default_value("security@oshinstar.com"),
        )
}

/// Build a Twilio config when credentials are present; without them the
/// server falls back to the logging notifier (local development).
#[must_use]
pub fn parse(matches: &ArgMatches) -> Option<TwilioConfig> {
    let account_sid = matches.get_one::<String>("twilio-account-sid")?.clone();
    let auth_token = matches.get_one::<String>("twilio-auth-token")?.clone();
    let sendgrid_api_key = matches.get_one::<String>("sendgrid-api-key")?.clone();

    Some(TwilioConfig {
        account_sid,
        auth_token: SecretString::from(auth_token),
        from_number: matches
            .get_one::<String>("twilio-from-number")
            .cloned()
            .unwrap_or_else(|| "+13214051396".to_string()),
        sendgrid_api_key: SecretString::from(sendgrid_api_key),
        mail_from: matches
            .get_one::<String>("mail-from")
            .cloned()
            .unwrap_or_else(|| "security@oshinstar.com".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "oshinstar",
            "--dsn",
            "postgres://localhost/oshinstar",
            "--access-token-secret",
            "a",
            "--refresh-token-secret",
            "r",
        ]
    }

    #[test]
    fn missing_credentials_mean_no_config() {
        temp_env::with_vars(
            [
                ("OSHINSTAR_TWILIO_ACCOUNT_SID", None::<&str>),
                ("OSHINSTAR_TWILIO_AUTH_TOKEN", None::<&str>),
                ("OSHINSTAR_SENDGRID_API_KEY", None::<&str>),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(base_args());
                assert!(parse(&matches).is_none());
            },
        );
    }

    #[test]
    fn full_credentials_build_a_config() {
        let command = crate::cli::commands::new();
        let mut args = base_args();
        args.extend([
            "--twilio-account-sid",
            "AC123",
            "--twilio-auth-token",
            "token",
            "--sendgrid-api-key",
            "sg",
        ]);
        let matches = command.get_matches_from(args);
        let config = parse(&matches).expect("config");
        assert_eq!(config.account_sid, "AC123");
        assert_eq!(config.from_number, "+13214051396");
        assert_eq!(config.mail_from, "security@oshinstar.com");
    }
}
