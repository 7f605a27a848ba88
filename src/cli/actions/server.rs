use crate::api::{self, PoolConfig};
use anyhow::{Result, anyhow};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub db_username: Option<String>,
    pub db_password: Option<SecretString>,
    pub db_max_connections: u32,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the DSN is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let dsn = build_dsn(&args.dsn, args.db_username.as_deref(), args.db_password.as_ref())?;

    debug!(
        "Starting server on port {} with up to {} database connections",
        args.port, args.db_max_connections
    );

    let pool_config = PoolConfig::new().with_max_connections(args.db_max_connections);

    api::new(args.port, dsn, pool_config).await
}

/// Injects the optional username/password into the DSN, replacing any present in it.
fn build_dsn(dsn: &str, username: Option<&str>, password: Option<&SecretString>) -> Result<String> {
    let mut dsn = Url::parse(dsn)?;

    if let Some(username) = username {
        dsn.set_username(username)
            .map_err(|()| anyhow!("Error setting username"))?;
    }

    if let Some(password) = password {
        dsn.set_password(Some(password.expose_secret()))
            .map_err(|()| anyhow!("Error setting password"))?;
    }

    Ok(dsn.to_string())
}
