//! Visibility filters for environment/project associations.
//!
//! The `visibility` query parameter selects one of a closed set of filters.
//! Each variant maps to a fixed predicate over the `ep` alias of
//! `environment_projects`; `is_hidden` is nullable and `NULL` counts as visible.

use sqlx::{Postgres, QueryBuilder};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Accepted `visibility` values in the order they are reported to callers.
pub const VISIBILITY_VALUES: [&str; 3] = ["all", "hidden", "visible"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    All,
}

impl Visibility {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::All => "all",
        }
    }

    /// Returns the SQL predicate for this filter, or `None` when no restriction applies.
    #[must_use]
    pub const fn predicate(self) -> Option<&'static str> {
        match self {
            Self::Visible => Some("ep.is_hidden IS NOT TRUE"),
            Self::Hidden => Some("ep.is_hidden IS TRUE"),
            Self::All => None,
        }
    }

    /// Appends the filter to a query whose `WHERE` clause is already open.
    pub fn apply(self, builder: &mut QueryBuilder<'_, Postgres>) {
        if let Some(predicate) = self.predicate() {
            builder.push(" AND ").push(predicate);
        }
    }

    /// Resolves the raw query value; an absent parameter means `visible`.
    ///
    /// # Errors
    /// Returns `InvalidVisibility` when the value is present but not one of `VISIBILITY_VALUES`.
    pub fn from_param(raw: Option<&str>) -> Result<Self, InvalidVisibility> {
        raw.map_or(Ok(Self::default()), str::parse::<Self>)
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = InvalidVisibility;

    // Exact, case-sensitive match.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "visible" => Ok(Self::Visible),
            "hidden" => Ok(Self::Hidden),
            "all" => Ok(Self::All),
            _ => Err(InvalidVisibility {
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid value for 'visibility', valid values are: {}", valid_values())]
pub struct InvalidVisibility {
    value: String,
}

impl InvalidVisibility {
    /// The rejected raw value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

fn valid_values() -> String {
    let quoted: Vec<String> = VISIBILITY_VALUES
        .iter()
        .map(|value| format!("'{value}'"))
        .collect();
    format!("[{}]", quoted.join(", "))
}
