use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_ACCESS_TOKEN_SECRET: &str = "access-token-secret";
pub const ARG_REFRESH_TOKEN_SECRET: &str = "refresh-token-secret";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_ACCESS_TOKEN_SECRET)
                .long(ARG_ACCESS_TOKEN_SECRET)
                .help("Signing secret for access tokens")
                .env("OSHINSTAR_ACCESS_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new(ARG_REFRESH_TOKEN_SECRET)
                .long(ARG_REFRESH_TOKEN_SECRET)
                .help("Signing secret for refresh tokens")
                .env("OSHINSTAR_REFRESH_TOKEN_SECRET")
                .required(true),
        )
        .arg(
            Arg::new("access-token-ttl-seconds")
                .long("access-token-ttl-seconds")
                .help("Access token lifetime in seconds")
                .env("OSHINSTAR_ACCESS_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("refresh-token-ttl-seconds")
                .long("refresh-token-ttl-seconds")
                .help("Refresh token lifetime in seconds")
                .env("OSHINSTAR_REFRESH_TOKEN_TTL_SECONDS")
                .default_value("604800")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("totp-issuer")
                .long("totp-issuer")
                .help("Issuer name shown in authenticator apps")
                .env("OSHINSTAR_TOTP_ISSUER")
                .default_value("oshinstar"),
        )
        .arg(
            Arg::new("frontend-base-url")
                .long("frontend-base-url")
                .help("Frontend origin allowed by CORS")
                .env("OSHINSTAR_FRONTEND_BASE_URL")
                .default_value("https://www.oshinstar.com"),
        )
        .arg(
            Arg::new("email-verify-base-url")
                .long("email-verify-base-url")
                .help("Base URL for email confirmation links")
                .env("OSHINSTAR_EMAIL_VERIFY_BASE_URL")
                .default_value("https://devservices.oshinstar.com/lambda/email-verifier"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub access_token_secret: SecretString,
    pub refresh_token_secret: SecretString,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub totp_issuer: String,
    pub frontend_base_url: String,
    pub email_verify_base_url: String,
}

impl Options {
    /// Read the auth options out of parsed matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let access_token_secret = matches
            .get_one::<String>(ARG_ACCESS_TOKEN_SECRET)
            .cloned()
            .context("missing required argument: --access-token-secret")?;
        let refresh_token_secret = matches
            .get_one::<String>(ARG_REFRESH_TOKEN_SECRET)
            .cloned()
            .context("missing required argument: --refresh-token-secret")?;

        Ok(Self {
            access_token_secret: SecretString::from(access_token_secret),
            refresh_token_secret: SecretString::from(refresh_token_secret),
            access_token_ttl_seconds: matches
                .get_one::<i64>("access-token-ttl-seconds")
                .copied()
                .unwrap_or(3600),
            refresh_token_ttl_seconds: matches
                .get_one::<i64>("refresh-token-ttl-seconds")
                .copied()
                .unwrap_or(604_800),
            totp_issuer: matches
                .get_one::<String>("totp-issuer")
                .cloned()
                .unwrap_or_else(|| "oshinstar".to_string()),
            frontend_base_url: matches
                .get_one::<String>("frontend-base-url")
                .cloned()
                .unwrap_or_else(|| "https://www.oshinstar.com".to_string()),
            email_verify_base_url: matches
                .get_one::<String>("email-verify-base-url")
                .cloned()
                .unwrap_or_else(|| {
                    "https://devservices.oshinstar.com/lambda/email-verifier".to_string()
                }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn options_parse_with_defaults() -> Result<()> {
        let command = crate::cli::commands::new();
        let matches = command.get_matches_from(vec![
            "oshinstar",
            "--dsn",
            "postgres://localhost/oshinstar",
            "--access-token-secret",
            "access-secret",
            "--refresh-token-secret",
            "refresh-secret",
        ]);

        let options = Options::parse(&matches)?;
        assert_eq!(options.access_token_secret.expose_secret(), "access-secret");
        assert_eq!(
            options.refresh_token_secret.expose_secret(),
            "refresh-secret"
        );
        assert_eq!(options.access_token_ttl_seconds, 3600);
        assert_eq!(options.refresh_token_ttl_seconds, 604_800);
        assert_eq!(options.totp_issuer, "oshinstar");
        Ok(())
    }

    #[test]
    fn token_ttls_are_configurable() -> Result<()> {
        let command = crate::cli::commands::new();
        let matches = command.get_matches_from(vec![
            "oshinstar",
            "--dsn",
            "postgres://localhost/oshinstar",
            "--access-token-secret",
            "a",
            "--refresh-token-secret",
            "r",
            "--access-token-ttl-seconds",
            "900",
            "--refresh-token-ttl-seconds",
            "2592000",
        ]);

        let options = Options::parse(&matches)?;
        assert_eq!(options.access_token_ttl_seconds, 900);
        assert_eq!(options.refresh_token_ttl_seconds, 2_592_000);
        Ok(())
    }
}
