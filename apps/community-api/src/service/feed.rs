use super::CommunityService;
use crate::db::store::FeedQuery;
use crate::error::ApiError;
use crate::models::community::CommunityType;
use crate::models::membership::has_moderator_capability;
use crate::models::post::Post;

pub const DEFAULT_FEED_LIMIT: i64 = 20;

/// Paging and caller for a single-community feed.
#[derive(Debug, Clone, Default)]
pub struct FeedOptions {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Moderators of the community also see pending posts.
    pub user_id: Option<String>,
}

/// Paging and scope for the merged feed of a user's communities.
#[derive(Debug, Clone, Default)]
pub struct AllFeedOptions {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub community_type: Option<CommunityType>,
}

impl CommunityService {
    fn feed_window(&self, limit: Option<i64>, offset: Option<i64>) -> (i64, i64) {
        let limit = limit
            .unwrap_or(DEFAULT_FEED_LIMIT)
            .clamp(1, self.max_feed_limit);
        let offset = offset.unwrap_or(0).max(0);
        (limit, offset)
    }

    /// Posts of one community, pinned first, then announcements, then newest.
    ///
    /// Pending posts are only included when `user_id` is an owner or admin.
    pub async fn get_community_feed(
        &self,
        community_id: &str,
        options: FeedOptions,
    ) -> Result<Vec<Post>, ApiError> {
        if self.communities.find_community(community_id).await?.is_none() {
            return Err(ApiError::not_found("Community not found"));
        }

        let privileged = match options.user_id.as_deref() {
            Some(user_id) => has_moderator_capability(self.get_user_role(community_id, user_id).await?),
            None => false,
        };

        let (limit, offset) = self.feed_window(options.limit, options.offset);
        let query = FeedQuery {
            community_ids: vec![community_id.to_string()],
            published_only: !privileged,
            limit,
            offset,
        };

        tracing::debug!(community_id, privileged, limit, offset, "community feed");
        self.posts.find_feed(&query).await
    }

    /// Merged feed over every community visible to `user_id`, optionally
    /// narrowed to one community type.
    ///
    /// Moderating any one contributing community reveals pending posts of
    /// the whole merged feed.
    pub async fn get_all_community_feed(
        &self,
        user_id: &str,
        options: AllFeedOptions,
    ) -> Result<Vec<Post>, ApiError> {
        let (communities, memberships) = self.visible_communities(user_id).await?;

        let community_ids: Vec<String> = communities
            .into_iter()
            .filter(|c| {
                options
                    .community_type
                    .map_or(true, |t| c.community_type == t)
            })
            .map(|c| c.id)
            .collect();

        if community_ids.is_empty() {
            return Ok(Vec::new());
        }

        let privileged = memberships.iter().any(|m| {
            m.role.can_moderate() && community_ids.iter().any(|id| *id == m.community_id)
        });

        let (limit, offset) = self.feed_window(options.limit, options.offset);
        let query = FeedQuery {
            community_ids,
            published_only: !privileged,
            limit,
            offset,
        };

        tracing::debug!(
            user_id,
            communities = query.community_ids.len(),
            privileged,
            limit,
            offset,
            "merged community feed"
        );
        self.posts.find_feed(&query).await
    }
}
