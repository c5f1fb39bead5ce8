//! User records and roles.
//!
//! The engine does not issue sessions; it only reads the caller's row to
//! resolve their role and hourly rate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Role of a caller, driving the access scope filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Finance,
    ProjectManager,
    TeamMember,
    Vendor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Finance => "finance",
            Self::ProjectManager => "project_manager",
            Self::TeamMember => "team_member",
            Self::Vendor => "vendor",
        }
    }

    /// Admin and finance see every project and document.
    pub fn is_unrestricted(self) -> bool {
        matches!(self, Self::Admin | Self::Finance)
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Self::Admin),
            "finance" => Ok(Self::Finance),
            "project_manager" => Ok(Self::ProjectManager),
            "team_member" => Ok(Self::TeamMember),
            "vendor" => Ok(Self::Vendor),
            other => Err(EngineError::Validation(format!("invalid role: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
    pub role: String,
    /// Rate in cents per hour; 0 means "no configured rate", so timesheet
    /// entries from this user generate no project cost.
    pub hourly_rate_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
