//! # Envlist (Environment Listing API)
//!
//! `envlist` serves read-only listings of the environments (for example
//! `production` or `staging`) that projects report events under.
//!
//! ## Tenant Model (Organizations, Projects, Environments)
//!
//! Organizations own projects and environments. An environment is linked to
//! every project that reported it through an environment/project association,
//! and that association carries the per-project visibility flag.
//!
//! - **Visibility:** listings accept `visibility=visible` (default), `hidden`
//!   or `all`. Anything else is rejected with `400` before storage is touched.
//! - **No environment:** the empty-name environment stands for untagged events
//!   and is never listed.
//! - **Ordering:** results are ordered by environment name, ascending.
//!
//! ## Endpoints
//!
//! - `GET /v1/organizations/{org_slug}/environments`
//! - `GET /v1/projects/{org_slug}/{project_slug}/environments`
//!
//! Unknown or soft-deleted organizations and projects return `404 Not Found`.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
