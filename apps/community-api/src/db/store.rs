//! Storage contracts consumed by the community service.
//!
//! Backed by Postgres in production ([`super::pg::PgStore`]) and an
//! in-memory map in tests and local runs ([`super::memory::MemoryStore`]).

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::community::{Community, CommunityType, NewCommunity};
use crate::models::membership::Membership;
use crate::models::post::{NewPost, Post};

#[async_trait]
pub trait CommunityStore: Send + Sync {
    async fn find_community(&self, id: &str) -> Result<Option<Community>, ApiError>;

    async fn find_global_community(&self) -> Result<Option<Community>, ApiError>;

    /// Newest first.
    async fn find_communities_by_type(
        &self,
        community_type: CommunityType,
    ) -> Result<Vec<Community>, ApiError>;

    /// Unordered; ids without a row are skipped.
    async fn find_communities_by_ids(&self, ids: &[String]) -> Result<Vec<Community>, ApiError>;

    /// Fails with a conflict when a second global community would be created.
    async fn insert_community(&self, community: NewCommunity) -> Result<Community, ApiError>;

    /// Insert a community and its owner's membership as one atomic write.
    async fn insert_community_with_owner(
        &self,
        community: NewCommunity,
        owner: Membership,
    ) -> Result<Community, ApiError>;

    async fn update_community(&self, community: &Community) -> Result<Community, ApiError>;
}

#[async_trait]
pub trait MembershipStore: Send + Sync {
    async fn find_membership(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> Result<Option<Membership>, ApiError>;

    /// Oldest membership first.
    async fn find_memberships_by_community(
        &self,
        community_id: &str,
    ) -> Result<Vec<Membership>, ApiError>;

    /// Oldest membership first.
    async fn find_memberships_by_user(&self, user_id: &str) -> Result<Vec<Membership>, ApiError>;

    /// Fails with a conflict when the (community, user) pair already exists.
    async fn insert_membership(&self, membership: Membership) -> Result<Membership, ApiError>;

    /// Returns whether a row was removed.
    async fn delete_membership(&self, id: &str) -> Result<bool, ApiError>;
}

/// Filter, ordering window and visibility for one feed page.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedQuery {
    pub community_ids: Vec<String>,
    /// Restrict to `publish` posts.
    pub published_only: bool,
    pub limit: i64,
    pub offset: i64,
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post, ApiError>;

    async fn find_one(&self, id: &str) -> Result<Option<Post>, ApiError>;

    /// Persist every mutable field of `post`, including the whole metadata.
    async fn save(&self, post: &Post) -> Result<Post, ApiError>;

    /// Posts of the given communities in feed order
    /// (see [`crate::models::post::feed_order`]), windowed by offset/limit.
    async fn find_feed(&self, query: &FeedQuery) -> Result<Vec<Post>, ApiError>;
}
