//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action to run.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, database};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let database = database::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn: database.dsn,
        db_username: database.username,
        db_password: database.password,
        db_max_connections: database.max_connections,
    }))
}
