use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_DSN: &str = "dsn";
pub const ARG_DB_USERNAME: &str = "db-username";
pub const ARG_DB_PASSWORD: &str = "db-password";
pub const ARG_DB_MAX_CONNECTIONS: &str = "db-max-connections";

#[derive(Debug, Clone)]
pub struct Options {
    pub dsn: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub max_connections: u32,
}

impl Options {
    /// Parse database arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the DSN is missing or empty.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let dsn = matches
            .get_one::<String>(ARG_DSN)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_DSN}"))?;

        let username = matches
            .get_one::<String>(ARG_DB_USERNAME)
            .cloned()
            .filter(|v| !v.trim().is_empty());

        let password = matches
            .get_one::<String>(ARG_DB_PASSWORD)
            .filter(|v| !v.is_empty())
            .map(|v| SecretString::from(v.clone()));

        Ok(Self {
            dsn,
            username,
            password,
            max_connections: matches
                .get_one::<u32>(ARG_DB_MAX_CONNECTIONS)
                .copied()
                .unwrap_or(5),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_DSN)
                .short('d')
                .long(ARG_DSN)
                .help("Database connection string")
                .long_help(
                    "Database connection string. Username/password may be supplied separately with --db-username/--db-password, in which case they replace the ones in the DSN.",
                )
                .env("ENVLIST_DSN")
                .required(true),
        )
        .arg(
            Arg::new(ARG_DB_USERNAME)
                .long(ARG_DB_USERNAME)
                .help("Database username, overrides the one in the DSN")
                .env("ENVLIST_DB_USERNAME"),
        )
        .arg(
            Arg::new(ARG_DB_PASSWORD)
                .long(ARG_DB_PASSWORD)
                .help("Database password, overrides the one in the DSN")
                .env("ENVLIST_DB_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_DB_MAX_CONNECTIONS)
                .long(ARG_DB_MAX_CONNECTIONS)
                .help("Maximum number of pooled database connections")
                .env("ENVLIST_DB_MAX_CONNECTIONS")
                .default_value("5")
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
}
