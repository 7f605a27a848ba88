//! Environments of a single project, with that project's visibility flag.

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
    storage::{fetch_project_environments, resolve_project},
    types::{ErrorDetail, ListEnvironmentsParams, ProjectEnvironmentResponse},
    visibility::Visibility,
};

#[utoipa::path(
    get,
    path = "/v1/projects/{org_slug}/{project_slug}/environments",
    params(
        ("org_slug" = String, Path, description = "Organization slug"),
        ("project_slug" = String, Path, description = "Project slug"),
        ListEnvironmentsParams
    ),
    responses(
        (status = 200, description = "Project environments ordered by name.", body = [ProjectEnvironmentResponse]),
        (status = 400, description = "Invalid visibility value.", body = ErrorDetail),
        (status = 404, description = "Organization or project not found."),
    ),
    tag = "environments"
)]
/// Lists a project's environments. When `visibility` is omitted only visible
/// environments are returned; `hidden` returns only hidden ones and `all` both.
pub async fn list_project_environments(
    Path((org_slug, project_slug)): Path<(String, String)>,
    Query(query): Query<Vec<(String, String)>>,
    pool: Extension<PgPool>,
) -> impl IntoResponse {
    let params = ListEnvironmentsParams::from_pairs(query);
    match list(&pool, &org_slug, &project_slug, params.visibility.as_deref()).await {
        Ok(rows) => (StatusCode::OK, Json(rows)).into_response(),
        Err(err) => err.into_response(),
    }
}

#[instrument(skip(pool))]
async fn list(
    pool: &PgPool,
    org_slug: &str,
    project_slug: &str,
    visibility: Option<&str>,
) -> Result<Vec<ProjectEnvironmentResponse>, ListError> {
    let visibility = Visibility::from_param(visibility)?;

    if !valid_slug(org_slug) || !valid_slug(project_slug) {
        return Err(ListError::NotFound);
    }

    let project = resolve_project(pool, org_slug, project_slug)
        .await?
        .ok_or(ListError::NotFound)?;

    Ok(fetch_project_environments(pool, &project, visibility).await?)
}
