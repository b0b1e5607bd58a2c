use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, OptionalExtension};
use diesel_async::AsyncConnection;
use scoped_futures::ScopedFutureExt;

use crate::db::pool::DbPool;
use crate::db::schema::{forum_posts, yaksa_communities, yaksa_community_members};
use crate::db::store::{CommunityStore, FeedQuery, MembershipStore, PostStore};
use crate::error::ApiError;
use crate::models::community::{
    Community, CommunityRow, CommunityType, NewCommunity, NewCommunityRow, UpdateCommunityRow,
};
use crate::models::membership::{Membership, MembershipRow, NewMembershipRow};
use crate::models::post::{NewPost, NewPostRow, Post, PostChangeset, PostRow, PostStatus};

/// Postgres-backed implementation of every store.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map a unique violation to a conflict; everything else is internal.
fn conflict_on_unique(err: diesel::result::Error, message: &str) -> ApiError {
    match err {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            ApiError::conflict(message)
        }
        other => other.into(),
    }
}

fn communities_from_rows(rows: Vec<CommunityRow>) -> Result<Vec<Community>, ApiError> {
    rows.into_iter().map(Community::try_from).collect()
}

fn memberships_from_rows(rows: Vec<MembershipRow>) -> Result<Vec<Membership>, ApiError> {
    rows.into_iter().map(Membership::try_from).collect()
}

// ---------------------------------------------------------------------------
// Communities
// ---------------------------------------------------------------------------

#[async_trait]
impl CommunityStore for PgStore {
    async fn find_community(&self, id: &str) -> Result<Option<Community>, ApiError> {
        let mut conn = self.pool.get().await?;

        let row: Option<CommunityRow> = diesel_async::RunQueryDsl::get_result(
            yaksa_communities::table
                .find(id)
                .select(CommunityRow::as_select()),
            &mut conn,
        )
        .await
        .optional()?;

        row.map(Community::try_from).transpose()
    }

    async fn find_global_community(&self) -> Result<Option<Community>, ApiError> {
        let mut conn = self.pool.get().await?;

        let row: Option<CommunityRow> = diesel_async::RunQueryDsl::get_result(
            yaksa_communities::table
                .filter(yaksa_communities::type_.eq(CommunityType::Global.as_str()))
                .order(yaksa_communities::created_at.asc())
                .select(CommunityRow::as_select()),
            &mut conn,
        )
        .await
        .optional()?;

        row.map(Community::try_from).transpose()
    }

    async fn find_communities_by_type(
        &self,
        community_type: CommunityType,
    ) -> Result<Vec<Community>, ApiError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<CommunityRow> = diesel_async::RunQueryDsl::load(
            yaksa_communities::table
                .filter(yaksa_communities::type_.eq(community_type.as_str()))
                .order((
                    yaksa_communities::created_at.desc(),
                    yaksa_communities::id.desc(),
                ))
                .select(CommunityRow::as_select()),
            &mut conn,
        )
        .await?;

        communities_from_rows(rows)
    }

    async fn find_communities_by_ids(&self, ids: &[String]) -> Result<Vec<Community>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await?;

        let rows: Vec<CommunityRow> = diesel_async::RunQueryDsl::load(
            yaksa_communities::table
                .filter(yaksa_communities::id.eq_any(ids))
                .select(CommunityRow::as_select()),
            &mut conn,
        )
        .await?;

        communities_from_rows(rows)
    }

    async fn insert_community(&self, community: NewCommunity) -> Result<Community, ApiError> {
        let mut conn = self.pool.get().await?;

        let row: CommunityRow = diesel_async::RunQueryDsl::get_result(
            diesel::insert_into(yaksa_communities::table)
                .values(NewCommunityRow::from(&community))
                .returning(CommunityRow::as_returning()),
            &mut conn,
        )
        .await
        .map_err(|err| conflict_on_unique(err, "A global community already exists"))?;

        Community::try_from(row)
    }

    async fn insert_community_with_owner(
        &self,
        community: NewCommunity,
        owner: Membership,
    ) -> Result<Community, ApiError> {
        let community_row = NewCommunityRow::from(&community);
        let owner_row = NewMembershipRow::from(&owner);

        let mut conn = self.pool.get().await?;

        let row = conn
            .transaction::<_, ApiError, _>(|conn| {
                async move {
                    // 1. Insert community.
                    let row: CommunityRow = diesel_async::RunQueryDsl::get_result(
                        diesel::insert_into(yaksa_communities::table)
                            .values(community_row)
                            .returning(CommunityRow::as_returning()),
                        conn,
                    )
                    .await
                    .map_err(|err| conflict_on_unique(err, "A global community already exists"))?;

                    // 2. Insert owner membership.
                    diesel_async::RunQueryDsl::execute(
                        diesel::insert_into(yaksa_community_members::table).values(owner_row),
                        conn,
                    )
                    .await
                    .map_err(|err| {
                        conflict_on_unique(err, "User is already a member of this community")
                    })?;

                    Ok(row)
                }
                .scope_boxed()
            })
            .await?;

        Community::try_from(row)
    }

    async fn update_community(&self, community: &Community) -> Result<Community, ApiError> {
        let mut conn = self.pool.get().await?;

        let row: CommunityRow = diesel_async::RunQueryDsl::get_result(
            diesel::update(yaksa_communities::table.find(&community.id))
                .set(UpdateCommunityRow {
                    name: &community.name,
                    description: community.description.as_deref(),
                    require_approval: community.require_approval,
                    metadata: &community.metadata,
                    updated_at: community.updated_at,
                })
                .returning(CommunityRow::as_returning()),
            &mut conn,
        )
        .await
        .optional()?
        .ok_or_else(|| ApiError::not_found("Community not found"))?;

        Community::try_from(row)
    }
}

// ---------------------------------------------------------------------------
// Memberships
// ---------------------------------------------------------------------------

#[async_trait]
impl MembershipStore for PgStore {
    async fn find_membership(
        &self,
        community_id: &str,
        user_id: &str,
    ) -> Result<Option<Membership>, ApiError> {
        let mut conn = self.pool.get().await?;

        let row: Option<MembershipRow> = diesel_async::RunQueryDsl::get_result(
            yaksa_community_members::table
                .filter(yaksa_community_members::community_id.eq(community_id))
                .filter(yaksa_community_members::user_id.eq(user_id))
                .select(MembershipRow::as_select()),
            &mut conn,
        )
        .await
        .optional()?;

        row.map(Membership::try_from).transpose()
    }

    async fn find_memberships_by_community(
        &self,
        community_id: &str,
    ) -> Result<Vec<Membership>, ApiError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<MembershipRow> = diesel_async::RunQueryDsl::load(
            yaksa_community_members::table
                .filter(yaksa_community_members::community_id.eq(community_id))
                .order((
                    yaksa_community_members::joined_at.asc(),
                    yaksa_community_members::id.asc(),
                ))
                .select(MembershipRow::as_select()),
            &mut conn,
        )
        .await?;

        memberships_from_rows(rows)
    }

    async fn find_memberships_by_user(&self, user_id: &str) -> Result<Vec<Membership>, ApiError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<MembershipRow> = diesel_async::RunQueryDsl::load(
            yaksa_community_members::table
                .filter(yaksa_community_members::user_id.eq(user_id))
                .order((
                    yaksa_community_members::joined_at.asc(),
                    yaksa_community_members::id.asc(),
                ))
                .select(MembershipRow::as_select()),
            &mut conn,
        )
        .await?;

        memberships_from_rows(rows)
    }

    async fn insert_membership(&self, membership: Membership) -> Result<Membership, ApiError> {
        let mut conn = self.pool.get().await?;

        let row: MembershipRow = diesel_async::RunQueryDsl::get_result(
            diesel::insert_into(yaksa_community_members::table)
                .values(NewMembershipRow::from(&membership))
                .returning(MembershipRow::as_returning()),
            &mut conn,
        )
        .await
        .map_err(|err| conflict_on_unique(err, "User is already a member of this community"))?;

        Membership::try_from(row)
    }

    async fn delete_membership(&self, id: &str) -> Result<bool, ApiError> {
        let mut conn = self.pool.get().await?;

        let deleted = diesel_async::RunQueryDsl::execute(
            diesel::delete(yaksa_community_members::table.find(id)),
            &mut conn,
        )
        .await?;

        Ok(deleted > 0)
    }
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

#[async_trait]
impl PostStore for PgStore {
    async fn create(&self, post: NewPost) -> Result<Post, ApiError> {
        let mut conn = self.pool.get().await?;

        let row: PostRow = diesel_async::RunQueryDsl::get_result(
            diesel::insert_into(forum_posts::table)
                .values(NewPostRow::from(&post))
                .returning(PostRow::as_returning()),
            &mut conn,
        )
        .await
        .map_err(|err| conflict_on_unique(err, "A post with this slug already exists"))?;

        Post::try_from(row)
    }

    async fn find_one(&self, id: &str) -> Result<Option<Post>, ApiError> {
        let mut conn = self.pool.get().await?;

        let row: Option<PostRow> = diesel_async::RunQueryDsl::get_result(
            forum_posts::table.find(id).select(PostRow::as_select()),
            &mut conn,
        )
        .await
        .optional()?;

        row.map(Post::try_from).transpose()
    }

    async fn save(&self, post: &Post) -> Result<Post, ApiError> {
        let mut conn = self.pool.get().await?;

        let row: PostRow = diesel_async::RunQueryDsl::get_result(
            diesel::update(forum_posts::table.find(&post.id))
                .set(PostChangeset::from(post))
                .returning(PostRow::as_returning()),
            &mut conn,
        )
        .await
        .optional()?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

        Post::try_from(row)
    }

    async fn find_feed(&self, query: &FeedQuery) -> Result<Vec<Post>, ApiError> {
        if query.community_ids.is_empty() {
            return Ok(Vec::new());
        }
        let started = Utc::now();
        let mut conn = self.pool.get().await?;

        let mut q = forum_posts::table
            .filter(
                forum_posts::community_id
                    .assume_not_null()
                    .eq_any(&query.community_ids),
            )
            .order((
                forum_posts::pinned.desc(),
                forum_posts::is_announcement.desc(),
                forum_posts::created_at.desc(),
                forum_posts::id.desc(),
            ))
            .offset(query.offset)
            .limit(query.limit)
            .select(PostRow::as_select())
            .into_boxed();

        if query.published_only {
            q = q.filter(forum_posts::status.eq(PostStatus::Publish.as_str()));
        }

        let rows: Vec<PostRow> = diesel_async::RunQueryDsl::load(q, &mut conn).await?;

        tracing::debug!(
            communities = query.community_ids.len(),
            rows = rows.len(),
            elapsed_ms = (Utc::now() - started).num_milliseconds(),
            "feed query"
        );

        rows.into_iter().map(Post::try_from).collect()
    }
}
