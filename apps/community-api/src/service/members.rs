use chrono::Utc;
use yaksa_common::id::{prefix, prefixed_ulid};

use super::CommunityService;
use crate::error::{ApiError, FieldError};
use crate::models::membership::{MemberRole, Membership};

impl CommunityService {
    /// Add `user_id` to a community with the given role.
    pub async fn join_community(
        &self,
        community_id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> Result<Membership, ApiError> {
        if self.communities.find_community(community_id).await?.is_none() {
            return Err(ApiError::not_found("Community not found"));
        }
        if self
            .memberships
            .find_membership(community_id, user_id)
            .await?
            .is_some()
        {
            return Err(ApiError::conflict(
                "User is already a member of this community",
            ));
        }

        let membership = self
            .memberships
            .insert_membership(Membership {
                id: prefixed_ulid(prefix::MEMBERSHIP),
                community_id: community_id.to_string(),
                user_id: user_id.to_string(),
                role,
                joined_at: Utc::now(),
            })
            .await?;

        tracing::info!(community_id, user_id, %role, "member joined");
        Ok(membership)
    }

    /// Add another user on behalf of a moderator. Ownership cannot be handed
    /// out this way.
    pub async fn add_member(
        &self,
        community_id: &str,
        actor_id: &str,
        user_id: &str,
        role: MemberRole,
    ) -> Result<Membership, ApiError> {
        if role == MemberRole::Owner {
            return Err(ApiError::validation(vec![FieldError {
                field: "role".to_string(),
                message: "A community has exactly one owner".to_string(),
            }]));
        }
        if self.communities.find_community(community_id).await?.is_none() {
            return Err(ApiError::not_found("Community not found"));
        }
        self.require_moderator(community_id, actor_id, "add members")
            .await?;
        self.join_community(community_id, user_id, role).await
    }

    /// Remove `user_id` from a community. Owners cannot leave.
    pub async fn leave_community(&self, community_id: &str, user_id: &str) -> Result<(), ApiError> {
        let membership = self
            .memberships
            .find_membership(community_id, user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Membership not found"))?;

        if !membership.role.can_leave() {
            return Err(ApiError::forbidden(
                "The community owner cannot leave the community",
            ));
        }

        if !self.memberships.delete_membership(&membership.id).await? {
            return Err(ApiError::not_found("Membership not found"));
        }

        tracing::info!(community_id, user_id, "member left");
        Ok(())
    }

    /// Members in join order.
    pub async fn get_community_members(
        &self,
        community_id: &str,
    ) -> Result<Vec<Membership>, ApiError> {
        self.memberships
            .find_memberships_by_community(community_id)
            .await
    }

    pub async fn is_member(&self, community_id: &str, user_id: &str) -> Result<bool, ApiError> {
        Ok(self
            .memberships
            .find_membership(community_id, user_id)
            .await?
            .is_some())
    }

    pub async fn get_user_role(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> Result<Option<MemberRole>, ApiError> {
        Ok(self
            .memberships
            .find_membership(community_id, user_id)
            .await?
            .map(|m| m.role))
    }
}
