use crate::api::handlers::{environments, health, root};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::get,
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use tokio::{net::TcpListener, signal};
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use utoipa_swagger_ui::SwaggerUi;

// Keep these internal to the crate while allowing CLI/server wiring to reference them.
pub(crate) mod handlers;
// OpenAPI document and its Cargo-derived info live in openapi.rs.
mod openapi;

pub use openapi::openapi;

/// Connection pool settings for the listing queries.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    min_connections: u32,
    max_connections: u32,
    max_lifetime: Duration,
}

impl PoolConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_connections: 1,
            max_connections: 5,
            max_lifetime: Duration::from_secs(60 * 2),
        }
    }

    #[must_use]
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self.min_connections = self.min_connections.min(self.max_connections);
        self
    }

    #[must_use]
    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the API router: listing endpoints, health, `/`, and the Swagger UI.
/// The caller provides the `PgPool` through an `Extension` layer.
#[must_use]
pub fn router() -> Router {
    Router::new()
        .route(
            "/v1/organizations/:org_slug/environments",
            get(environments::organization::list_organization_environments),
        )
        .route(
            "/v1/projects/:org_slug/:project_slug/environments",
            get(environments::project::list_project_environments),
        )
        .route("/health", get(health::health).options(health::health))
        .route("/", get(root::root))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi()))
}

/// Attach the request-id, tracing, and pool layers to `router()`.
#[must_use]
pub fn app(pool: PgPool) -> Router {
    router().layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(Extension(pool)),
    )
}

/// Start the server
/// # Errors
/// Return error if failed to connect to the database or to start the server
pub async fn new(port: u16, dsn: String, pool_config: PoolConfig) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(pool_config.min_connections)
        .max_connections(pool_config.max_connections)
        .max_lifetime(pool_config.max_lifetime)
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app(pool).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => tracing::error!("Failed to listen for SIGTERM: {err}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
