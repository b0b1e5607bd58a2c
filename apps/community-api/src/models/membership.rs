use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::schema::yaksa_community_members;
use crate::error::ApiError;

/// A member's standing inside one community.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Admin,
    #[default]
    Member,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }

    /// Owners and admins may pin, announce and approve.
    pub fn can_moderate(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Owners are bound to their community until ownership moves elsewhere.
    pub fn can_leave(self) -> bool {
        self != Self::Owner
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(format!("unknown member role `{other}`")),
        }
    }
}

/// Moderator capability for an optional role; no membership means no rights.
pub fn has_moderator_capability(role: Option<MemberRole>) -> bool {
    role.is_some_and(MemberRole::can_moderate)
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Membership {
    pub id: String,
    pub community_id: String,
    pub user_id: String,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Diesel rows
// ---------------------------------------------------------------------------

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = yaksa_community_members)]
pub struct MembershipRow {
    pub id: String,
    pub community_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

impl TryFrom<MembershipRow> for Membership {
    type Error = ApiError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        let role = row.role.parse().map_err(|err: String| {
            tracing::error!(membership_id = %row.id, %err, "corrupt membership row");
            ApiError::internal("An internal error occurred")
        })?;
        Ok(Self {
            id: row.id,
            community_id: row.community_id,
            user_id: row.user_id,
            role,
            joined_at: row.joined_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = yaksa_community_members)]
pub struct NewMembershipRow<'a> {
    pub id: &'a str,
    pub community_id: &'a str,
    pub user_id: &'a str,
    pub role: &'a str,
    pub joined_at: DateTime<Utc>,
}

impl<'a> From<&'a Membership> for NewMembershipRow<'a> {
    fn from(m: &'a Membership) -> Self {
        Self {
            id: &m.id,
            community_id: &m.community_id,
            user_id: &m.user_id,
            role: m.role.as_str(),
            joined_at: m.joined_at,
        }
    }
}
