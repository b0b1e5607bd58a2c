pub mod communities;
pub mod feed;
pub mod health;
pub mod members;
pub mod posts;

use axum::Router;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().merge(health::router()).nest(
        "/api/v1",
        communities::router()
            .merge(members::router())
            .merge(feed::router())
            .merge(posts::router()),
    )
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "user_id",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-User-Id"))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health,
        // Communities
        communities::create_community,
        communities::list_communities,
        communities::get_global_community,
        communities::list_my_communities,
        communities::get_community,
        communities::update_community,
        // Members
        members::list_members,
        members::join_community,
        members::leave_community,
        members::add_member,
        members::get_member_role,
        // Feed
        feed::community_feed,
        feed::all_community_feed,
        // Posts
        posts::create_post,
        posts::pin_post,
        posts::unpin_post,
        posts::set_announcement,
        posts::unset_announcement,
        posts::approve_post,
    ),
    components(
        schemas(
            // Error types
            crate::error::ApiErrorBody,
            crate::error::ApiErrorDetail,
            crate::error::FieldError,
            // Models
            crate::models::community::Community,
            crate::models::community::CommunityType,
            crate::models::community::CommunityChanges,
            crate::models::membership::Membership,
            crate::models::membership::MemberRole,
            crate::models::post::Post,
            crate::models::post::PostStatus,
            crate::service::NewCommunityPost,
            // Route request/response types
            health::HealthResponse,
            communities::CreateCommunityRequest,
            communities::ListCommunitiesResponse,
            members::ListMembersResponse,
            members::AddMemberRequest,
            members::MemberRoleResponse,
            feed::FeedResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Communities", description = "Community lifecycle and discovery"),
        (name = "Members", description = "Community membership"),
        (name = "Feed", description = "Community feeds"),
        (name = "Posts", description = "Community posts"),
        (name = "Moderation", description = "Pinning, announcements and approval"),
    )
)]
pub struct ApiDoc;
