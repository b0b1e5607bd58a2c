//! Community feed endpoints.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::middleware::{AuthUser, MaybeUser};
use crate::error::{ApiError, ApiErrorBody};
use crate::models::community::CommunityType;
use crate::models::post::Post;
use crate::service::{AllFeedOptions, FeedOptions};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/communities/{id}/feed", get(community_feed))
        .route("/feed", get(all_community_feed))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FeedResponse {
    pub data: Vec<Post>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedQueryParams {
    /// Page size (default 20).
    pub limit: Option<i64>,
    /// Posts to skip (default 0).
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AllFeedQueryParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    /// Only include communities of this type.
    #[serde(rename = "type")]
    pub community_type: Option<CommunityType>,
}

// ---------------------------------------------------------------------------
// GET /api/v1/communities/:id/feed
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/communities/{id}/feed",
    tag = "Feed",
    params(("id" = String, Path, description = "Community ID"), FeedQueryParams),
    responses(
        (status = 200, description = "Feed page", body = FeedResponse),
        (status = 404, description = "Community not found", body = ApiErrorBody),
    ),
)]
pub async fn community_feed(
    MaybeUser { user_id }: MaybeUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<FeedQueryParams>,
) -> Result<Json<FeedResponse>, ApiError> {
    let data = state
        .service
        .get_community_feed(
            &id,
            FeedOptions {
                limit: params.limit,
                offset: params.offset,
                user_id,
            },
        )
        .await?;

    Ok(Json(FeedResponse { data }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/feed
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/feed",
    tag = "Feed",
    security(("user_id" = [])),
    params(AllFeedQueryParams),
    responses(
        (status = 200, description = "Merged feed of the caller's communities", body = FeedResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn all_community_feed(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<AllFeedQueryParams>,
) -> Result<Json<FeedResponse>, ApiError> {
    let data = state
        .service
        .get_all_community_feed(
            &user_id,
            AllFeedOptions {
                limit: params.limit,
                offset: params.offset,
                community_type: params.community_type,
            },
        )
        .await?;

    Ok(Json(FeedResponse { data }))
}
