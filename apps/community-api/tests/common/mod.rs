#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, OnceLock};

use axum::http::HeaderName;
use axum::Router;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::Connection;
use diesel_migrations::MigrationHarness;

use community_api::auth::middleware::USER_ID_HEADER;
use community_api::config::{with_test_db_suffix, Config};
use community_api::db::memory::MemoryStore;
use community_api::db::pg::PgStore;
use community_api::db::store::PostStore;
use community_api::models::community::{Community, CommunityType};
use community_api::models::membership::MemberRole;
use community_api::models::post::{
    CommunityPostExtension, NewPost, Post, PostMetadata, PostStatus,
};
use community_api::service::{CommunityService, CreateCommunity, NewCommunityPost};
use community_api::AppState;
use yaksa_common::id::{prefix, prefixed_ulid};

/// A service over a fresh in-memory store, plus the store for direct seeding.
pub fn test_service() -> (CommunityService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = CommunityService::with_store(store.clone(), Config::default().max_feed_limit);
    (service, store)
}

/// A Postgres store on the `<db>_test` database, migrated on first use.
///
/// Returns `None` when `DATABASE_URL` is unset so database tests can skip on
/// machines without Postgres.
pub fn pg_store() -> Option<Arc<PgStore>> {
    static MIGRATED: OnceLock<()> = OnceLock::new();

    let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let _ = dotenvy::from_path(env_path);

    let database_url = with_test_db_suffix(&Config::from_env().database_url?);

    MIGRATED.get_or_init(|| {
        let mut conn = PgConnection::establish(&database_url).expect("connect to test database");
        conn.run_pending_migrations(community_api::db::MIGRATIONS)
            .expect("run migrations");
    });

    let pool = community_api::db::pool::connect(&database_url, 4).expect("build test pool");
    Some(Arc::new(PgStore::new(pool)))
}

/// A service over the Postgres test store, plus the store itself.
pub fn pg_service() -> Option<(CommunityService, Arc<PgStore>)> {
    let store = pg_store()?;
    let service = CommunityService::with_store(store.clone(), Config::default().max_feed_limit);
    Some((service, store))
}

/// Build the full application router wired to a fresh in-memory state.
pub fn test_app() -> (Router, AppState, Arc<MemoryStore>) {
    let (service, store) = test_service();
    let state = AppState { service };
    let app = community_api::routes::router().with_state(state.clone());
    (app, state, store)
}

pub fn user_header() -> HeaderName {
    HeaderName::from_static(USER_ID_HEADER)
}

pub fn new_user_id() -> String {
    prefixed_ulid("usr")
}

/// Create a branch community owned by `owner_id`.
pub async fn setup_community(
    service: &CommunityService,
    owner_id: &str,
    require_approval: bool,
) -> Community {
    let mut input = CreateCommunity::new("Test Branch", CommunityType::Branch, owner_id);
    input.require_approval = require_approval;
    service.create_community(input).await.expect("create community")
}

/// Add a fresh user with `role` to the community and return their id.
pub async fn add_user(service: &CommunityService, community_id: &str, role: MemberRole) -> String {
    let user_id = new_user_id();
    service
        .join_community(community_id, &user_id, role)
        .await
        .expect("join community");
    user_id
}

pub fn post_input(title: &str) -> NewCommunityPost {
    NewCommunityPost {
        title: title.to_string(),
        content: format!("Body of {title}"),
        category_id: "cat_general".to_string(),
        post_type: None,
        tags: None,
        is_announcement: None,
    }
}

/// Seed a post straight into the store with explicit flags and timestamps.
pub async fn insert_post(
    store: &MemoryStore,
    community_id: Option<&str>,
    pinned: bool,
    is_announcement: bool,
    status: PostStatus,
    created_at: DateTime<Utc>,
) -> Post {
    seed_post(store, community_id, pinned, is_announcement, status, created_at).await
}

/// [`insert_post`] against any post store.
pub async fn seed_post(
    store: &dyn PostStore,
    community_id: Option<&str>,
    pinned: bool,
    is_announcement: bool,
    status: PostStatus,
    created_at: DateTime<Utc>,
) -> Post {
    let id = prefixed_ulid(prefix::POST);
    store
        .create(NewPost {
            title: id.clone(),
            content: "seeded".to_string(),
            author_id: "usr_seed".to_string(),
            category_id: "cat_general".to_string(),
            post_type: "discussion".to_string(),
            tags: vec![],
            status,
            slug: id.to_lowercase(),
            published_at: (status == PostStatus::Publish).then_some(created_at),
            metadata: PostMetadata {
                yaksa: community_id.map(|community_id| CommunityPostExtension {
                    community_id: community_id.to_string(),
                    is_announcement,
                    pinned,
                }),
                extra: Default::default(),
            },
            created_at,
            id,
        })
        .await
        .expect("seed post")
}
