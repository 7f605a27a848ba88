//! Environments across the projects of an organization.

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use tracing::instrument;

use super::super::valid_slug;
use super::{
    ListError,
    storage::{fetch_accessible_project_ids, fetch_organization_environments, resolve_organization},
    types::{EnvironmentResponse, ErrorDetail, ListEnvironmentsParams},
    visibility::Visibility,
};

#[utoipa::path(
    get,
    path = "/v1/organizations/{org_slug}/environments",
    params(
        ("org_slug" = String, Path, description = "Organization slug"),
        ListEnvironmentsParams
    ),
    responses(
        (status = 200, description = "Environments ordered by name.", body = [EnvironmentResponse]),
        (status = 400, description = "Invalid visibility value.", body = ErrorDetail),
        (status = 404, description = "Organization not found."),
    ),
    tag = "environments"
)]
/// Lists the distinct environments reported by the organization's projects.
/// The empty-name environment is never returned; rows are ordered by name.
pub async fn list_organization_environments(
    Path(org_slug): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let params = ListEnvironmentsParams::from_pairs(query);
    match list(&pool, &org_slug, params.visibility.as_deref()).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[instrument(skip(pool))]
async fn list(
    pool: &PgPool,
    org_slug: &str,
    visibility: Option<&str>,
) -> Result<Vec<EnvironmentResponse>, ListError> {
    let visibility = Visibility::from_param(visibility)?;

    if !valid_slug(org_slug) {
        return Err(ListError::NotFound);
    }

    let organization = resolve_organization(pool, org_slug)
        .await?
        .ok_or(ListError::NotFound)?;

    let project_ids = fetch_accessible_project_ids(pool, organization.id()).await?;

    Ok(fetch_organization_environments(pool, organization.id(), &project_ids, visibility).await?)
}
