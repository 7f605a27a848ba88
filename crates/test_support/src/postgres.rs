use anyhow::{Context, Result};
use sqlx::{Connection, PgConnection};
use testcontainers::{
    ContainerAsync, GenericImage, ImageExt,
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
};
use tokio::time::{Duration, sleep};
use url::Url;

use crate::unique_name;

const POSTGRES_PORT: u16 = 5432;
const READY_ATTEMPTS: u32 = 20;

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    image: String,
    tag: String,
    user: String,
    password: String,
    db_name: String,
}

impl PostgresConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            image: "postgres".to_string(),
            tag: "17".to_string(),
            user: "postgres".to_string(),
            password: "postgres".to_string(),
            db_name: "envlist".to_string(),
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    #[must_use]
    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = db_name.into();
        self
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Postgres container. Dropping it stops the container.
#[derive(Debug)]
pub struct PostgresContainer {
    _container: ContainerAsync<GenericImage>,
    host_port: u16,
    config: PostgresConfig,
}

impl PostgresContainer {
    /// Start a Postgres container in the specified network.
    ///
    /// # Errors
    /// Returns an error if the container fails to start or the port cannot be resolved.
    pub async fn start(network: &str) -> Result<Self> {
        Self::start_with_config(network, PostgresConfig::new()).await
    }

    /// # Errors
    /// Returns an error if the container fails to start or the port cannot be resolved.
    pub async fn start_with_config(network: &str, config: PostgresConfig) -> Result<Self> {
        crate::runtime::ensure_container_runtime()?;

        let container = GenericImage::new(&config.image, &config.tag)
            .with_exposed_port(POSTGRES_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_USER", &config.user)
            .with_env_var("POSTGRES_PASSWORD", &config.password)
            .with_env_var("POSTGRES_DB", &config.db_name)
            .with_network(network)
            .with_container_name(unique_name("envlist-postgres"))
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let host_port = container
            .get_host_port_ipv4(POSTGRES_PORT.tcp())
            .await
            .context("Failed to resolve Postgres host port")?;

        Ok(Self {
            _container: container,
            host_port,
            config,
        })
    }

    #[must_use]
    pub fn admin_dsn(&self) -> String {
        format!(
            "postgres://{}:{}@127.0.0.1:{}/{}?sslmode=disable",
            self.config.user, self.config.password, self.host_port, self.config.db_name
        )
    }

    #[must_use]
    pub fn host_port(&self) -> u16 {
        self.host_port
    }

    /// Wait until Postgres accepts connections.
    ///
    /// The "ready" log line shows up once during init and again after the
    /// restart, so the first one is not enough on its own.
    ///
    /// # Errors
    /// Returns an error if Postgres does not become ready after retries.
    pub async fn wait_until_ready(&self) -> Result<()> {
        let dsn = self.admin_dsn();
        let mut attempts = 0;

        loop {
            match PgConnection::connect(&dsn).await {
                Ok(connection) => {
                    drop(connection);
                    return Ok(());
                }
                Err(err) => {
                    attempts += 1;
                    if attempts >= READY_ATTEMPTS {
                        return Err(err).context("Postgres did not become ready");
                    }
                    sleep(Duration::from_millis(250)).await;
                }
            }
        }
    }

    /// Run every statement of a `psql`-style script against this container's database.
    ///
    /// # Errors
    /// Returns an error naming the first statement that fails.
    pub async fn apply_sql(&self, sql: &str) -> Result<()> {
        apply_sql(&self.admin_dsn(), sql).await
    }
}

/// Run every statement of a `psql`-style script, in order, on one connection.
///
/// # Errors
/// Returns an error naming the first statement that fails.
pub async fn apply_sql(dsn: &str, sql: &str) -> Result<()> {
    let mut connection = PgConnection::connect(dsn)
        .await
        .context("failed to connect for schema setup")?;

    for (index, statement) in split_sql_statements(sql).iter().enumerate() {
        sqlx::query(statement)
            .execute(&mut connection)
            .await
            .with_context(|| format!("failed to execute schema statement {}", index + 1))?;
    }

    Ok(())
}

/// Creates an empty database named `<prefix>_<uuid>` on the server behind `dsn`
/// and returns a DSN pointing at it. Lets tests share one external server
/// without seeing each other's rows.
///
/// # Errors
/// Returns an error if the DSN is invalid or the database cannot be created.
pub async fn create_database(dsn: &str, prefix: &str) -> Result<String> {
    let name = format!("{prefix}_{}", uuid::Uuid::new_v4().simple());
    let mut connection = PgConnection::connect(dsn)
        .await
        .context("failed to connect to the server database")?;
    sqlx::query(&format!("CREATE DATABASE \"{name}\""))
        .execute(&mut connection)
        .await
        .with_context(|| format!("failed to create database {name}"))?;

    database_dsn(dsn, &name)
}

fn database_dsn(dsn: &str, db_name: &str) -> Result<String> {
    let mut url = Url::parse(dsn).context("invalid DSN")?;
    url.set_path(db_name);
    Ok(url.to_string())
}

/// Splits on lines ending with `;`. `\ir` includes and comment-only chunks are dropped.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("\\ir ") || trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            push_statement(&mut statements, &current);
            current.clear();
        }
    }
    push_statement(&mut statements, &current);

    statements
}

fn push_statement(statements: &mut Vec<String>, chunk: &str) {
    let statement = chunk.trim();
    if !statement.is_empty() {
        statements.push(statement.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_config_defaults_are_expected() {
        let config = PostgresConfig::new();
        assert_eq!(config.image, "postgres");
        assert_eq!(config.tag, "17");
        assert_eq!(config.user, "postgres");
        assert_eq!(config.db_name, "envlist");
    }

    #[test]
    fn postgres_config_overrides_fields() {
        let config = PostgresConfig::default()
            .with_tag("16")
            .with_db_name("other");
        assert_eq!(config.tag, "16");
        assert_eq!(config.db_name, "other");
    }

    #[test]
    fn database_dsn_replaces_only_the_path() {
        let dsn = database_dsn(
            "postgres://ci:pw@db.internal:5432/postgres?sslmode=disable",
            "envlist_abc",
        );
        assert_eq!(
            dsn.ok().as_deref(),
            Some("postgres://ci:pw@db.internal:5432/envlist_abc?sslmode=disable")
        );
    }

    #[test]
    fn split_sql_statements_skips_includes_and_comments() {
        let sql = "\\ir extensions.sql\n-- tables\nCREATE TABLE a (\n  id INT\n);\n\nSELECT 1;\ntrailing";
        let statements = split_sql_statements(sql);
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE a (\n  id INT\n);".to_string(),
                "SELECT 1;".to_string(),
                "trailing".to_string(),
            ]
        );
    }
}
