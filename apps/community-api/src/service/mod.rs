//! Community feed and moderation service.
//!
//! Stateless orchestration over the community, membership and post stores.
//! Every operation is a handful of reads followed by at most one logical
//! write; failures surface as [`ApiError`] without retries.

mod communities;
mod feed;
mod members;
mod moderation;
mod posts;

use std::sync::Arc;

use crate::db::store::{CommunityStore, MembershipStore, PostStore};
use crate::error::ApiError;
use crate::models::membership::MemberRole;

pub use communities::{CreateCommunity, GLOBAL_COMMUNITY_DESCRIPTION, GLOBAL_COMMUNITY_NAME};
pub use feed::{AllFeedOptions, FeedOptions, DEFAULT_FEED_LIMIT};
pub use posts::NewCommunityPost;

#[derive(Clone)]
pub struct CommunityService {
    communities: Arc<dyn CommunityStore>,
    memberships: Arc<dyn MembershipStore>,
    posts: Arc<dyn PostStore>,
    max_feed_limit: i64,
}

impl CommunityService {
    pub fn new(
        communities: Arc<dyn CommunityStore>,
        memberships: Arc<dyn MembershipStore>,
        posts: Arc<dyn PostStore>,
        max_feed_limit: i64,
    ) -> Self {
        Self {
            communities,
            memberships,
            posts,
            max_feed_limit: max_feed_limit.max(1),
        }
    }

    /// Build a service whose three stores are one backend.
    pub fn with_store<S>(store: Arc<S>, max_feed_limit: i64) -> Self
    where
        S: CommunityStore + MembershipStore + PostStore + 'static,
    {
        Self::new(store.clone(), store.clone(), store, max_feed_limit)
    }

    /// Fail with forbidden unless `user_id` may moderate `community_id`.
    async fn require_moderator(
        &self,
        community_id: &str,
        user_id: &str,
        action: &str,
    ) -> Result<MemberRole, ApiError> {
        match self.get_user_role(community_id, user_id).await? {
            Some(role) if role.can_moderate() => Ok(role),
            _ => Err(ApiError::forbidden(format!(
                "Only community owners and admins can {action}"
            ))),
        }
    }
}
