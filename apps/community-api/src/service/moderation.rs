use chrono::Utc;

use super::CommunityService;
use crate::error::ApiError;
use crate::models::post::{CommunityPostExtension, Post, PostStatus};

impl CommunityService {
    /// Load a post and check that `user_id` moderates the community it
    /// belongs to.
    async fn load_for_moderation(
        &self,
        post_id: &str,
        user_id: &str,
        action: &str,
    ) -> Result<Post, ApiError> {
        let post = self
            .posts
            .find_one(post_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Post not found"))?;

        let community_id = post
            .metadata
            .community_id()
            .ok_or_else(|| ApiError::invalid_state("Post is not associated with a community"))?;

        self.require_moderator(community_id, user_id, action).await?;
        Ok(post)
    }

    /// Flip one community flag on a post, leaving all other metadata as is.
    async fn update_extension(
        &self,
        post_id: &str,
        user_id: &str,
        action: &str,
        update: impl FnOnce(&mut CommunityPostExtension),
    ) -> Result<Post, ApiError> {
        let mut post = self.load_for_moderation(post_id, user_id, action).await?;

        let ext = post
            .metadata
            .yaksa
            .as_mut()
            .ok_or_else(|| ApiError::invalid_state("Post is not associated with a community"))?;
        update(ext);
        post.updated_at = Utc::now();

        let post = self.posts.save(&post).await?;
        tracing::info!(post_id, user_id, action, "post moderated");
        Ok(post)
    }

    pub async fn pin_post(&self, post_id: &str, user_id: &str) -> Result<Post, ApiError> {
        self.update_extension(post_id, user_id, "pin posts", |ext| ext.pinned = true)
            .await
    }

    pub async fn unpin_post(&self, post_id: &str, user_id: &str) -> Result<Post, ApiError> {
        self.update_extension(post_id, user_id, "unpin posts", |ext| ext.pinned = false)
            .await
    }

    pub async fn set_announcement(&self, post_id: &str, user_id: &str) -> Result<Post, ApiError> {
        self.update_extension(post_id, user_id, "mark announcements", |ext| {
            ext.is_announcement = true
        })
        .await
    }

    pub async fn unset_announcement(
        &self,
        post_id: &str,
        user_id: &str,
    ) -> Result<Post, ApiError> {
        self.update_extension(post_id, user_id, "unmark announcements", |ext| {
            ext.is_announcement = false
        })
        .await
    }

    /// Publish a post now, whatever its current status.
    pub async fn approve_post(&self, post_id: &str, user_id: &str) -> Result<Post, ApiError> {
        let mut post = self
            .load_for_moderation(post_id, user_id, "approve posts")
            .await?;

        let now = Utc::now();
        let previous = post.status;
        post.status = PostStatus::Publish;
        post.published_at = Some(now);
        post.updated_at = now;

        let post = self.posts.save(&post).await?;
        tracing::info!(post_id, user_id, %previous, "post approved");
        Ok(post)
    }
}
