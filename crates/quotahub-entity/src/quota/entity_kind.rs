//! Quota owner entity kind enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of entity a quota record accounts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "quota_entity_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// An individual user account.
    User,
    /// A department / organization unit.
    Department,
    /// A whole organization.
    Organization,
}

impl EntityKind {
    /// Return the entity kind as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Department => "department",
            Self::Organization => "organization",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = quotahub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "department" => Ok(Self::Department),
            "organization" => Ok(Self::Organization),
            _ => Err(quotahub_core::AppError::validation(format!(
                "Invalid entity kind: '{s}'. Expected one of: user, department, organization"
            ))),
        }
    }
}
