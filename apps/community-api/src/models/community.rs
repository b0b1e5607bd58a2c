use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::schema::yaksa_communities;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommunityType {
    Personal,
    Branch,
    Division,
    Global,
}

impl CommunityType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Branch => "branch",
            Self::Division => "division",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for CommunityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommunityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "personal" => Ok(Self::Personal),
            "branch" => Ok(Self::Branch),
            "division" => Ok(Self::Division),
            "global" => Ok(Self::Global),
            other => Err(format!("unknown community type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Community {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub community_type: CommunityType,
    pub owner_user_id: Option<String>,
    pub organization_id: Option<String>,
    pub require_approval: bool,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Community {
    pub fn is_global(&self) -> bool {
        self.community_type == CommunityType::Global
    }
}

/// A community about to be persisted. Ids and timestamps are assigned by the
/// service, not the store.
#[derive(Debug, Clone)]
pub struct NewCommunity {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub community_type: CommunityType,
    pub owner_user_id: Option<String>,
    pub organization_id: Option<String>,
    pub require_approval: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl NewCommunity {
    pub fn into_community(self) -> Community {
        Community {
            id: self.id,
            name: self.name,
            description: self.description,
            community_type: self.community_type,
            owner_user_id: self.owner_user_id,
            organization_id: self.organization_id,
            require_approval: self.require_approval,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Partial update of a community's settings. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CommunityChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub require_approval: Option<bool>,
    /// Keys are merged into the existing metadata object.
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl CommunityChanges {
    /// Apply the changes in place and bump `updated_at`.
    pub fn apply(self, community: &mut Community, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            community.name = name;
        }
        if let Some(description) = self.description {
            community.description = Some(description);
        }
        if let Some(require_approval) = self.require_approval {
            community.require_approval = require_approval;
        }
        if let Some(extra) = self.metadata {
            if !community.metadata.is_object() {
                community.metadata = serde_json::Value::Object(Default::default());
            }
            if let Some(map) = community.metadata.as_object_mut() {
                map.extend(extra);
            }
        }
        community.updated_at = now;
    }
}

// ---------------------------------------------------------------------------
// Diesel rows
// ---------------------------------------------------------------------------

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = yaksa_communities)]
pub struct CommunityRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub type_: String,
    pub owner_user_id: Option<String>,
    pub organization_id: Option<String>,
    pub require_approval: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<CommunityRow> for Community {
    type Error = ApiError;

    fn try_from(row: CommunityRow) -> Result<Self, Self::Error> {
        let community_type = row.type_.parse().map_err(|err: String| {
            tracing::error!(community_id = %row.id, %err, "corrupt community row");
            ApiError::internal("An internal error occurred")
        })?;
        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            community_type,
            owner_user_id: row.owner_user_id,
            organization_id: row.organization_id,
            require_approval: row.require_approval,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = yaksa_communities)]
pub struct NewCommunityRow<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub type_: &'a str,
    pub owner_user_id: Option<&'a str>,
    pub organization_id: Option<&'a str>,
    pub require_approval: bool,
    pub metadata: &'a serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a NewCommunity> for NewCommunityRow<'a> {
    fn from(c: &'a NewCommunity) -> Self {
        Self {
            id: &c.id,
            name: &c.name,
            description: c.description.as_deref(),
            type_: c.community_type.as_str(),
            owner_user_id: c.owner_user_id.as_deref(),
            organization_id: c.organization_id.as_deref(),
            require_approval: c.require_approval,
            metadata: &c.metadata,
            created_at: c.created_at,
            updated_at: c.created_at,
        }
    }
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = yaksa_communities)]
pub struct UpdateCommunityRow<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub require_approval: bool,
    pub metadata: &'a serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
