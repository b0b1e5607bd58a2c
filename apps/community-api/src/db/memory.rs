use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::db::store::{CommunityStore, FeedQuery, MembershipStore, PostStore};
use crate::error::ApiError;
use crate::models::community::{Community, CommunityType, NewCommunity};
use crate::models::membership::Membership;
use crate::models::post::{feed_order, NewPost, Post, PostStatus};

#[derive(Default)]
struct Tables {
    communities: HashMap<String, Community>,
    memberships: HashMap<String, Membership>,
    posts: HashMap<String, Post>,
}

impl Tables {
    fn has_global(&self) -> bool {
        self.communities.values().any(Community::is_global)
    }

    fn membership_exists(&self, community_id: &str, user_id: &str) -> bool {
        self.memberships
            .values()
            .any(|m| m.community_id == community_id && m.user_id == user_id)
    }
}

/// In-memory implementation of every store, for tests and database-less runs.
///
/// All tables sit behind one lock, so multi-row writes are atomic and the
/// uniqueness rules of the Postgres schema are checked at insert time.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_join(mut memberships: Vec<Membership>) -> Vec<Membership> {
    memberships.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.id.cmp(&b.id)));
    memberships
}

#[async_trait]
impl CommunityStore for MemoryStore {
    async fn find_community(&self, id: &str) -> Result<Option<Community>, ApiError> {
        Ok(self.tables.lock().communities.get(id).cloned())
    }

    async fn find_global_community(&self) -> Result<Option<Community>, ApiError> {
        Ok(self
            .tables
            .lock()
            .communities
            .values()
            .find(|c| c.is_global())
            .cloned())
    }

    async fn find_communities_by_type(
        &self,
        community_type: CommunityType,
    ) -> Result<Vec<Community>, ApiError> {
        let mut list: Vec<Community> = self
            .tables
            .lock()
            .communities
            .values()
            .filter(|c| c.community_type == community_type)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(list)
    }

    async fn find_communities_by_ids(&self, ids: &[String]) -> Result<Vec<Community>, ApiError> {
        let tables = self.tables.lock();
        Ok(ids
            .iter()
            .filter_map(|id| tables.communities.get(id).cloned())
            .collect())
    }

    async fn insert_community(&self, community: NewCommunity) -> Result<Community, ApiError> {
        let mut tables = self.tables.lock();
        if community.community_type == CommunityType::Global && tables.has_global() {
            return Err(ApiError::conflict("A global community already exists"));
        }
        let community = community.into_community();
        tables
            .communities
            .insert(community.id.clone(), community.clone());
        Ok(community)
    }

    async fn insert_community_with_owner(
        &self,
        community: NewCommunity,
        owner: Membership,
    ) -> Result<Community, ApiError> {
        let mut tables = self.tables.lock();
        if community.community_type == CommunityType::Global && tables.has_global() {
            return Err(ApiError::conflict("A global community already exists"));
        }
        let community = community.into_community();
        tables
            .communities
            .insert(community.id.clone(), community.clone());
        tables.memberships.insert(owner.id.clone(), owner);
        Ok(community)
    }

    async fn update_community(&self, community: &Community) -> Result<Community, ApiError> {
        let mut tables = self.tables.lock();
        let slot = tables
            .communities
            .get_mut(&community.id)
            .ok_or_else(|| ApiError::not_found("Community not found"))?;
        *slot = community.clone();
        Ok(community.clone())
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn find_membership(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> Result<Option<Membership>, ApiError> {
        Ok(self
            .tables
            .lock()
            .memberships
            .values()
            .find(|m| m.community_id == community_id && m.user_id == user_id)
            .cloned())
    }

    async fn find_memberships_by_community(
        &self,
        community_id: &str,
    ) -> Result<Vec<Membership>, ApiError> {
        let list = self
            .tables
            .lock()
            .memberships
            .values()
            .filter(|m| m.community_id == community_id)
            .cloned()
            .collect();
        Ok(sorted_by_join(list))
    }

    async fn find_memberships_by_user(&self, user_id: &str) -> Result<Vec<Membership>, ApiError> {
        let list = self
            .tables
            .lock()
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_by_join(list))
    }

    async fn insert_membership(&self, membership: Membership) -> Result<Membership, ApiError> {
        let mut tables = self.tables.lock();
        if tables.membership_exists(&membership.community_id, &membership.user_id) {
            return Err(ApiError::conflict(
                "User is already a member of this community",
            ));
        }
        tables
            .memberships
            .insert(membership.id.clone(), membership.clone());
        Ok(membership)
    }

    async fn delete_membership(&self, id: &str) -> Result<bool, ApiError> {
        Ok(self.tables.lock().memberships.remove(id).is_some())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, ApiError> {
        let mut tables = self.tables.lock();
        if tables.posts.values().any(|p| p.slug == post.slug) {
            return Err(ApiError::conflict("A post with this slug already exists"));
        }
        let post = post.into_post();
        tables.posts.insert(post.id.clone(), post.clone());
        Ok(post)
    }

    async fn find_one(&self, id: &str) -> Result<Option<Post>, ApiError> {
        Ok(self.tables.lock().posts.get(id).cloned())
    }

    async fn save(&self, post: &Post) -> Result<Post, ApiError> {
        let mut tables = self.tables.lock();
        let slot = tables
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| ApiError::not_found("Post not found"))?;
        *slot = post.clone();
        Ok(post.clone())
    }

    async fn find_feed(&self, query: &FeedQuery) -> Result<Vec<Post>, ApiError> {
        let mut matched: Vec<Post> = self
            .tables
            .lock()
            .posts
            .values()
            .filter(|p| {
                p.metadata
                    .community_id()
                    .is_some_and(|id| query.community_ids.iter().any(|c| c == id))
            })
            .filter(|p| !query.published_only || p.status == PostStatus::Publish)
            .cloned()
            .collect();
        matched.sort_by(feed_order);

        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = usize::try_from(query.limit).unwrap_or(0);
        Ok(matched.into_iter().skip(offset).take(limit).collect())
    }
}
