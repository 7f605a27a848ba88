//! Request/response types for the environment listing APIs.
//!
//! These payloads are shared between handlers and `OpenAPI` generation.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEnvironmentsParams {
    /// `visible` (default), `hidden` or `all`.
    pub visibility: Option<String>,
}

impl ListEnvironmentsParams {
    /// Builds the params from raw query pairs. A repeated `visibility` keeps its last value.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let visibility = pairs
            .into_iter()
            .filter(|(key, _)| key == "visibility")
            .map(|(_, value)| value)
            .last();
        Self { visibility }
    }
}

/// An environment as listed for an organization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct EnvironmentResponse {
    pub id: String,
    pub name: String,
}

/// An environment as seen by one project, including that project's visibility flag.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEnvironmentResponse {
    pub id: String,
    pub name: String,
    pub is_hidden: bool,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct ErrorDetail {
    pub detail: String,
}
