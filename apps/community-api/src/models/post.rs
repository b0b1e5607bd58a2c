use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::schema::forum_posts;
use crate::error::ApiError;

pub const DEFAULT_POST_TYPE: &str = "discussion";

/// Metadata key holding the [`CommunityPostExtension`].
const EXTENSION_KEY: &str = "yaksa";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Pending,
    Publish,
    Rejected,
    Archived,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Publish => "publish",
            Self::Rejected => "rejected",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "pending" => Ok(Self::Pending),
            "publish" => Ok(Self::Publish),
            "rejected" => Ok(Self::Rejected),
            "archived" => Ok(Self::Archived),
            other => Err(format!("unknown post status `{other}`")),
        }
    }
}

/// Community linkage and moderation flags of a post (`metadata.yaksa`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityPostExtension {
    pub community_id: String,
    #[serde(default)]
    pub is_announcement: bool,
    #[serde(default)]
    pub pinned: bool,
}

/// Post metadata: the typed community extension plus whatever other keys
/// callers attached, kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yaksa: Option<CommunityPostExtension>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PostMetadata {
    pub fn community_id(&self) -> Option<&str> {
        self.yaksa.as_ref().map(|ext| ext.community_id.as_str())
    }

    fn extra_as_value(&self) -> serde_json::Value {
        let mut extra = self.extra.clone();
        extra.remove(EXTENSION_KEY);
        serde_json::Value::Object(extra)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub category_id: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub slug: String,
    pub published_at: Option<DateTime<Utc>>,
    #[schema(value_type = Object)]
    pub metadata: PostMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn is_pinned(&self) -> bool {
        self.metadata.yaksa.as_ref().is_some_and(|ext| ext.pinned)
    }

    pub fn is_announcement(&self) -> bool {
        self.metadata
            .yaksa
            .as_ref()
            .is_some_and(|ext| ext.is_announcement)
    }
}

/// Feed ordering: pinned first, then announcements, then newest first.
/// Ties on all three fall back to descending id so pages are stable.
pub fn feed_order(a: &Post, b: &Post) -> Ordering {
    b.is_pinned()
        .cmp(&a.is_pinned())
        .then_with(|| b.is_announcement().cmp(&a.is_announcement()))
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| b.id.cmp(&a.id))
}

/// A post about to be persisted.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub category_id: String,
    pub post_type: String,
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub slug: String,
    pub published_at: Option<DateTime<Utc>>,
    pub metadata: PostMetadata,
    pub created_at: DateTime<Utc>,
}

impl NewPost {
    pub fn into_post(self) -> Post {
        Post {
            id: self.id,
            title: self.title,
            content: self.content,
            author_id: self.author_id,
            category_id: self.category_id,
            post_type: self.post_type,
            tags: self.tags,
            status: self.status,
            slug: self.slug,
            published_at: self.published_at,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Diesel rows
// ---------------------------------------------------------------------------

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = forum_posts)]
pub struct PostRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub category_id: String,
    pub post_type: String,
    pub tags: Vec<String>,
    pub status: String,
    pub slug: String,
    pub published_at: Option<DateTime<Utc>>,
    pub community_id: Option<String>,
    pub pinned: bool,
    pub is_announcement: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = ApiError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|err: String| {
            tracing::error!(post_id = %row.id, %err, "corrupt post row");
            ApiError::internal("An internal error occurred")
        })?;
        // The columns own the community extension; a stale copy in the
        // jsonb bag would otherwise serialize as a second `yaksa` key.
        let extra = match row.metadata {
            serde_json::Value::Object(mut map) => {
                map.remove(EXTENSION_KEY);
                map
            }
            _ => serde_json::Map::new(),
        };
        let yaksa = row.community_id.map(|community_id| CommunityPostExtension {
            community_id,
            is_announcement: row.is_announcement,
            pinned: row.pinned,
        });
        Ok(Self {
            id: row.id,
            title: row.title,
            content: row.content,
            author_id: row.author_id,
            category_id: row.category_id,
            post_type: row.post_type,
            tags: row.tags,
            status,
            slug: row.slug,
            published_at: row.published_at,
            metadata: PostMetadata { yaksa, extra },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = forum_posts)]
pub struct NewPostRow<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub author_id: &'a str,
    pub category_id: &'a str,
    pub post_type: &'a str,
    pub tags: &'a [String],
    pub status: &'a str,
    pub slug: &'a str,
    pub published_at: Option<DateTime<Utc>>,
    pub community_id: Option<&'a str>,
    pub pinned: bool,
    pub is_announcement: bool,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a NewPost> for NewPostRow<'a> {
    fn from(p: &'a NewPost) -> Self {
        let ext = p.metadata.yaksa.as_ref();
        Self {
            id: &p.id,
            title: &p.title,
            content: &p.content,
            author_id: &p.author_id,
            category_id: &p.category_id,
            post_type: &p.post_type,
            tags: &p.tags,
            status: p.status.as_str(),
            slug: &p.slug,
            published_at: p.published_at,
            community_id: ext.map(|e| e.community_id.as_str()),
            pinned: ext.is_some_and(|e| e.pinned),
            is_announcement: ext.is_some_and(|e| e.is_announcement),
            metadata: p.metadata.extra_as_value(),
            created_at: p.created_at,
            updated_at: p.created_at,
        }
    }
}

/// Full rewrite of a post's mutable columns.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = forum_posts, treat_none_as_null = true)]
pub struct PostChangeset<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub category_id: &'a str,
    pub post_type: &'a str,
    pub tags: &'a [String],
    pub status: &'a str,
    pub slug: &'a str,
    pub published_at: Option<DateTime<Utc>>,
    pub community_id: Option<&'a str>,
    pub pinned: bool,
    pub is_announcement: bool,
    pub metadata: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Post> for PostChangeset<'a> {
    fn from(p: &'a Post) -> Self {
        let ext = p.metadata.yaksa.as_ref();
        Self {
            title: &p.title,
            content: &p.content,
            category_id: &p.category_id,
            post_type: &p.post_type,
            tags: &p.tags,
            status: p.status.as_str(),
            slug: &p.slug,
            published_at: p.published_at,
            community_id: ext.map(|e| e.community_id.as_str()),
            pinned: ext.is_some_and(|e| e.pinned),
            is_announcement: ext.is_some_and(|e| e.is_announcement),
            metadata: p.metadata.extra_as_value(),
            updated_at: p.updated_at,
        }
    }
}
