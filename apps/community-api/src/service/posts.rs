use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use yaksa_common::id::{prefix, prefixed_ulid};
use yaksa_common::post_slug;

use super::CommunityService;
use crate::error::{ApiError, FieldError};
use crate::models::post::{
    CommunityPostExtension, NewPost, Post, PostMetadata, PostStatus, DEFAULT_POST_TYPE,
};

/// Input of [`CommunityService::create_community_post`].
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewCommunityPost {
    pub title: String,
    pub content: String,
    pub category_id: String,
    #[serde(rename = "type")]
    pub post_type: Option<String>,
    pub tags: Option<Vec<String>>,
    pub is_announcement: Option<bool>,
}

impl CommunityService {
    /// Publish a post into a community on behalf of one of its members.
    ///
    /// In approval-gated communities the post starts as `pending` without a
    /// publication time until a moderator approves it.
    pub async fn create_community_post(
        &self,
        community_id: &str,
        user_id: &str,
        input: NewCommunityPost,
    ) -> Result<Post, ApiError> {
        let community = self
            .communities
            .find_community(community_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Community not found"))?;

        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ApiError::validation(vec![FieldError {
                field: "title".to_string(),
                message: "Title is required".to_string(),
            }]));
        }

        let role = self
            .get_user_role(community_id, user_id)
            .await?
            .ok_or_else(|| ApiError::forbidden("You are not a member of this community"))?;

        let is_announcement = input.is_announcement.unwrap_or(false);
        if is_announcement && !role.can_moderate() {
            return Err(ApiError::forbidden(
                "Only community owners and admins can post announcements",
            ));
        }

        let now = Utc::now();
        let (status, published_at) = if community.require_approval {
            (PostStatus::Pending, None)
        } else {
            (PostStatus::Publish, Some(now))
        };

        let post = self
            .posts
            .create(NewPost {
                id: prefixed_ulid(prefix::POST),
                slug: post_slug(&title, now),
                title,
                content: input.content,
                author_id: user_id.to_string(),
                category_id: input.category_id,
                post_type: input
                    .post_type
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| DEFAULT_POST_TYPE.to_string()),
                tags: input.tags.unwrap_or_default(),
                status,
                published_at,
                metadata: PostMetadata {
                    yaksa: Some(CommunityPostExtension {
                        community_id: community.id.clone(),
                        is_announcement,
                        pinned: false,
                    }),
                    extra: Default::default(),
                },
                created_at: now,
            })
            .await?;

        tracing::info!(
            post_id = %post.id,
            community_id,
            user_id,
            %status,
            is_announcement,
            "community post created"
        );

        Ok(post)
    }
}
