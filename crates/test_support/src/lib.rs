//! Throwaway infrastructure for envlist integration tests.
//!
//! Tests either start a Postgres container on a private network or create a
//! scratch database on an external server (`postgres::create_database`), apply
//! the schema and talk to it through the returned DSN. When no container
//! runtime is reachable `runtime::ensure_container_runtime` fails.

pub mod postgres;
pub mod runtime;

use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct TestNetwork {
    name: String,
}

impl TestNetwork {
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        Self {
            name: unique_name(prefix),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

pub(crate) fn unique_name(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}
