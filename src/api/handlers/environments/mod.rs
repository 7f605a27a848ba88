//! Environment listing endpoints.
//!
//! Environments belong to an organization and are linked to the projects that
//! reported them. Each link carries a per-project `is_hidden` flag, so the same
//! environment can be visible in one project and hidden in another.
//!
//! The handler modules only parse inputs and map the high-level flow, while
//! `storage` owns the SQL and response shaping.
//!
//! Flow Overview:
//! 1) Validate the `visibility` parameter (`400` before any storage access).
//! 2) Validate path slugs and resolve the organization or project (`404` when missing).
//! 3) Run a single listing query: sentinel excluded, ordered by name.

pub(crate) mod organization;
pub(crate) mod project;
mod storage;
pub(crate) mod types;
pub mod visibility;

pub(crate) use self::storage::ListError;
