//! SQL storage helpers for the environment listings.
//!
//! Scope resolution (organization, project, accessible projects) and the two
//! listing queries live here. Every listing excludes the empty-name
//! environment and orders by environment name.

use axum::{Json, http::StatusCode, response::IntoResponse};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{Instrument, debug, error, info_span};
use uuid::Uuid;

use super::{
    types::{EnvironmentResponse, ErrorDetail, ProjectEnvironmentResponse},
    visibility::{InvalidVisibility, Visibility},
};

#[derive(Debug)]
pub(super) struct OrganizationRow {
    id: Uuid,
}

impl OrganizationRow {
    pub(super) fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Debug)]
pub(super) struct ProjectRow {
    id: Uuid,
    organization_id: Uuid,
}

impl ProjectRow {
    pub(super) fn id(&self) -> Uuid {
        self.id
    }

    /// Owning organization, used to constrain listings so Postgres can use the org indexes.
    pub(super) fn organization_id(&self) -> Uuid {
        self.organization_id
    }
}

#[derive(Debug)]
pub(crate) enum ListError {
    InvalidVisibility(InvalidVisibility),
    NotFound,
    Database(sqlx::Error),
}

impl From<InvalidVisibility> for ListError {
    fn from(err: InvalidVisibility) -> Self {
        Self::InvalidVisibility(err)
    }
}

impl From<sqlx::Error> for ListError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err)
    }
}

impl IntoResponse for ListError {
    /// Maps listing failures into stable HTTP responses.
    /// A bad `visibility` value is caller input and only logged at debug level.
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::InvalidVisibility(err) => {
                debug!("Rejected visibility value {:?}", err.value());
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorDetail {
                        detail: err.to_string(),
                    }),
                )
                    .into_response()
            }
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Database(err) => {
                error!("Database error: {err}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Resolves a non-deleted organization by slug.
pub(super) async fn resolve_organization(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<OrganizationRow>, sqlx::Error> {
    let row = sqlx::query(
        r"
        SELECT id
        FROM organizations
        WHERE slug = $1 AND deleted_at IS NULL
        LIMIT 1
        ",
    )
    .bind(slug)
    .fetch_optional(pool)
    .instrument(db_span("organizations"))
    .await?;
    Ok(row.map(|row| OrganizationRow { id: row.get("id") }))
}

/// Resolves a non-deleted project by slug under a non-deleted organization.
pub(super) async fn resolve_project(
    pool: &PgPool,
    org_slug: &str,
    project_slug: &str,
) -> Result<Option<ProjectRow>, sqlx::Error> {
    let row = sqlx::query(
        r"
        SELECT p.id, p.organization_id
        FROM projects p
        JOIN organizations o ON o.id = p.organization_id
        WHERE o.slug = $1
            AND p.slug = $2
            AND o.deleted_at IS NULL
            AND p.deleted_at IS NULL
        LIMIT 1
        ",
    )
    .bind(org_slug)
    .bind(project_slug)
    .fetch_optional(pool)
    .instrument(db_span("projects"))
    .await?;
    Ok(row.map(|row| ProjectRow {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
    }))
}

/// Returns the ids of the organization's non-deleted projects.
/// This is the widest accessible set; callers that know the requester may narrow it.
pub(super) async fn fetch_accessible_project_ids(
    pool: &PgPool,
    organization_id: Uuid,
) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows = sqlx::query(
        r"
        SELECT id
        FROM projects
        WHERE organization_id = $1 AND deleted_at IS NULL
        ",
    )
    .bind(organization_id)
    .fetch_all(pool)
    .instrument(db_span("projects"))
    .await?;
    Ok(rows.into_iter().map(|row| row.get("id")).collect())
}

/// Lists the distinct environments linked to any of `project_ids` under `visibility`.
/// An environment hidden in one project and visible in another matches both filters.
pub(super) async fn fetch_organization_environments(
    pool: &PgPool,
    organization_id: Uuid,
    project_ids: &[Uuid],
    visibility: Visibility,
) -> Result<Vec<EnvironmentResponse>, sqlx::Error> {
    if project_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder = organization_environments_query(organization_id, project_ids, visibility);
    let rows = builder
        .build()
        .fetch_all(pool)
        .instrument(db_span("environments"))
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| EnvironmentResponse {
            id: row.get("id"),
            name: row.get("name"),
        })
        .collect())
}

/// Lists a project's environment associations under `visibility`, joined with their environment.
pub(super) async fn fetch_project_environments(
    pool: &PgPool,
    project: &ProjectRow,
    visibility: Visibility,
) -> Result<Vec<ProjectEnvironmentResponse>, sqlx::Error> {
    let mut builder = project_environments_query(project, visibility);
    let rows = builder
        .build()
        .fetch_all(pool)
        .instrument(db_span("environment_projects"))
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| ProjectEnvironmentResponse {
            id: row.get("id"),
            name: row.get("name"),
            is_hidden: row.get("is_hidden"),
        })
        .collect())
}

fn organization_environments_query(
    organization_id: Uuid,
    project_ids: &[Uuid],
    visibility: Visibility,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        r"
        SELECT e.id::text AS id, e.name
        FROM environments e
        WHERE e.organization_id = ",
    );
    builder.push_bind(organization_id);
    builder.push(
        r"
            AND e.name <> ''
            AND e.id IN (
                SELECT ep.environment_id
                FROM environment_projects ep
                WHERE ep.project_id = ANY(",
    );
    builder.push_bind(project_ids.to_vec());
    builder.push(")");
    visibility.apply(&mut builder);
    builder.push(
        r"
            )
        ORDER BY e.name ASC
        ",
    );
    builder
}

fn project_environments_query(
    project: &ProjectRow,
    visibility: Visibility,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(
        r"
        SELECT e.id::text AS id, e.name, ep.is_hidden IS TRUE AS is_hidden
        FROM environment_projects ep
        JOIN environments e ON e.id = ep.environment_id
        WHERE ep.project_id = ",
    );
    builder.push_bind(project.id());
    builder.push(" AND e.organization_id = ");
    builder.push_bind(project.organization_id());
    builder.push(" AND e.name <> ''");
    visibility.apply(&mut builder);
    builder.push(" ORDER BY e.name ASC");
    builder
}

fn db_span(table: &'static str) -> tracing::Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.sql.table = table
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn squash(sql: &str) -> String {
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn organization_query_filters_sentinel_and_orders_by_name() {
        let project_ids = [Uuid::new_v4(), Uuid::new_v4()];
        let builder =
            organization_environments_query(Uuid::new_v4(), &project_ids, Visibility::Visible);
        assert_eq!(
            squash(builder.sql()),
            "SELECT e.id::text AS id, e.name FROM environments e \
             WHERE e.organization_id = $1 AND e.name <> '' \
             AND e.id IN ( SELECT ep.environment_id FROM environment_projects ep \
             WHERE ep.project_id = ANY($2) AND ep.is_hidden IS NOT TRUE ) \
             ORDER BY e.name ASC"
        );
    }

    #[test]
    fn organization_query_all_has_no_visibility_predicate() {
        let builder =
            organization_environments_query(Uuid::new_v4(), &[Uuid::new_v4()], Visibility::All);
        assert!(!builder.sql().contains("is_hidden"));
        assert!(builder.sql().contains("e.name <> ''"));
    }

    #[test]
    fn project_query_constrains_org_and_orders_by_name() {
        let project = ProjectRow {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
        };
        let builder = project_environments_query(&project, Visibility::Hidden);
        assert_eq!(
            squash(builder.sql()),
            "SELECT e.id::text AS id, e.name, ep.is_hidden IS TRUE AS is_hidden \
             FROM environment_projects ep JOIN environments e ON e.id = ep.environment_id \
             WHERE ep.project_id = $1 AND e.organization_id = $2 AND e.name <> '' \
             AND ep.is_hidden IS TRUE ORDER BY e.name ASC"
        );
    }

    #[test]
    fn invalid_visibility_maps_to_400() {
        let Err(err) = Visibility::from_param(Some("bogus")) else {
            panic!("bogus must not parse");
        };
        let response = ListError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            ListError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn database_error_maps_to_500() {
        let response = ListError::from(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
