use std::collections::HashMap;

use chrono::Utc;
use serde_json::json;
use yaksa_common::id::{prefix, prefixed_ulid, SYSTEM_USER_ID};

use super::CommunityService;
use crate::error::{ApiError, ErrorKind, FieldError};
use crate::models::community::{Community, CommunityChanges, CommunityType, NewCommunity};
use crate::models::membership::{MemberRole, Membership};

pub const GLOBAL_COMMUNITY_NAME: &str = "Yaksa Community";
pub const GLOBAL_COMMUNITY_DESCRIPTION: &str = "The community every member belongs to";

const MAX_NAME_CHARS: usize = 100;

/// Input of [`CommunityService::create_community`].
#[derive(Debug, Clone)]
pub struct CreateCommunity {
    pub name: String,
    pub description: Option<String>,
    pub community_type: CommunityType,
    pub owner_user_id: String,
    pub organization_id: Option<String>,
    pub require_approval: bool,
    pub metadata: Option<serde_json::Value>,
}

impl CreateCommunity {
    pub fn new(
        name: impl Into<String>,
        community_type: CommunityType,
        owner_user_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            community_type,
            owner_user_id: owner_user_id.into(),
            organization_id: None,
            require_approval: false,
            metadata: None,
        }
    }
}

fn validate_name(name: &str, errors: &mut Vec<FieldError>) {
    if name.is_empty() {
        errors.push(FieldError {
            field: "name".to_string(),
            message: "Community name is required".to_string(),
        });
    } else if name.chars().count() > MAX_NAME_CHARS {
        errors.push(FieldError {
            field: "name".to_string(),
            message: format!("Community name must be {MAX_NAME_CHARS} characters or fewer"),
        });
    }
}

impl CommunityService {
    /// Return the global community, creating it on first use.
    ///
    /// Concurrent first callers may both try to insert; the store rejects the
    /// loser with a conflict and the loser returns the committed row.
    pub async fn ensure_global_community(&self) -> Result<Community, ApiError> {
        if let Some(global) = self.communities.find_global_community().await? {
            return Ok(global);
        }

        let new = NewCommunity {
            id: prefixed_ulid(prefix::COMMUNITY),
            name: GLOBAL_COMMUNITY_NAME.to_string(),
            description: Some(GLOBAL_COMMUNITY_DESCRIPTION.to_string()),
            community_type: CommunityType::Global,
            owner_user_id: Some(SYSTEM_USER_ID.to_string()),
            organization_id: None,
            require_approval: false,
            metadata: json!({ "is_system": true, "auto_created": true }),
            created_at: Utc::now(),
        };

        match self.communities.insert_community(new).await {
            Ok(global) => {
                tracing::info!(community_id = %global.id, "global community created");
                Ok(global)
            }
            Err(err) if err.kind() == ErrorKind::Conflict => {
                tracing::debug!("global community created concurrently; re-reading");
                self.communities
                    .find_global_community()
                    .await?
                    .ok_or_else(|| ApiError::internal("Global community disappeared"))
            }
            Err(err) => Err(err),
        }
    }

    /// Create a community owned by `input.owner_user_id`, together with the
    /// owner's membership.
    pub async fn create_community(&self, input: CreateCommunity) -> Result<Community, ApiError> {
        let name = input.name.trim().to_string();
        let mut errors = Vec::new();
        validate_name(&name, &mut errors);
        if input.community_type == CommunityType::Global {
            errors.push(FieldError {
                field: "type".to_string(),
                message: "The global community is managed by the system".to_string(),
            });
        }
        let metadata = input
            .metadata
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));
        if !metadata.is_object() {
            errors.push(FieldError {
                field: "metadata".to_string(),
                message: "Metadata must be a JSON object".to_string(),
            });
        }
        if !errors.is_empty() {
            return Err(ApiError::validation(errors));
        }

        let now = Utc::now();
        let community_id = prefixed_ulid(prefix::COMMUNITY);
        let new = NewCommunity {
            id: community_id.clone(),
            name,
            description: input.description,
            community_type: input.community_type,
            owner_user_id: Some(input.owner_user_id.clone()),
            organization_id: input.organization_id,
            require_approval: input.require_approval,
            metadata,
            created_at: now,
        };
        let owner = Membership {
            id: prefixed_ulid(prefix::MEMBERSHIP),
            community_id,
            user_id: input.owner_user_id,
            role: MemberRole::Owner,
            joined_at: now,
        };

        let community = self
            .communities
            .insert_community_with_owner(new, owner)
            .await?;

        tracing::info!(
            community_id = %community.id,
            community_type = %community.community_type,
            owner = ?community.owner_user_id,
            "community created"
        );

        Ok(community)
    }

    pub async fn get_community(&self, id: &str) -> Result<Option<Community>, ApiError> {
        self.communities.find_community(id).await
    }

    /// Communities of one type, newest first.
    pub async fn list_communities_by_type(
        &self,
        community_type: CommunityType,
    ) -> Result<Vec<Community>, ApiError> {
        self.communities.find_communities_by_type(community_type).await
    }

    /// Change name, description, approval gating or metadata. Owners and
    /// admins only.
    pub async fn update_community_settings(
        &self,
        community_id: &str,
        user_id: &str,
        changes: CommunityChanges,
    ) -> Result<Community, ApiError> {
        let mut community = self
            .communities
            .find_community(community_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Community not found"))?;

        self.require_moderator(community_id, user_id, "change community settings")
            .await?;

        let mut changes = changes;
        if let Some(name) = changes.name.take() {
            let name = name.trim().to_string();
            let mut errors = Vec::new();
            validate_name(&name, &mut errors);
            if !errors.is_empty() {
                return Err(ApiError::validation(errors));
            }
            changes.name = Some(name);
        }

        changes.apply(&mut community, Utc::now());
        let community = self.communities.update_community(&community).await?;

        tracing::info!(
            community_id = %community.id,
            user_id,
            require_approval = community.require_approval,
            "community settings updated"
        );

        Ok(community)
    }

    /// Every community visible to `user_id`: explicit memberships in join
    /// order, with the global community in front when it is only implicit.
    pub async fn list_my_communities(&self, user_id: &str) -> Result<Vec<Community>, ApiError> {
        let (communities, _) = self.visible_communities(user_id).await?;
        Ok(communities)
    }

    /// Visible communities plus the memberships that back them.
    pub(super) async fn visible_communities(
        &self,
        user_id: &str,
    ) -> Result<(Vec<Community>, Vec<Membership>), ApiError> {
        let global = self.ensure_global_community().await?;
        let memberships = self.memberships.find_memberships_by_user(user_id).await?;

        let ids: Vec<String> = memberships.iter().map(|m| m.community_id.clone()).collect();
        let mut by_id: HashMap<String, Community> = self
            .communities
            .find_communities_by_ids(&ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        let mut communities: Vec<Community> = ids.iter().filter_map(|id| by_id.remove(id)).collect();
        if !communities.iter().any(|c| c.id == global.id) {
            communities.insert(0, global);
        }

        Ok((communities, memberships))
    }
}
