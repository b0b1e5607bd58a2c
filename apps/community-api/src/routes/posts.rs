//! Community post creation and moderation endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{post, put};
use axum::{Json, Router};

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::post::Post;
use crate::service::NewCommunityPost;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/communities/{id}/posts", post(create_post))
        .route("/posts/{post_id}/pin", put(pin_post).delete(unpin_post))
        .route(
            "/posts/{post_id}/announcement",
            put(set_announcement).delete(unset_announcement),
        )
        .route("/posts/{post_id}/approve", post(approve_post))
}

// ---------------------------------------------------------------------------
// POST /api/v1/communities/:id/posts
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/communities/{id}/posts",
    tag = "Posts",
    security(("user_id" = [])),
    params(("id" = String, Path, description = "Community ID")),
    request_body = NewCommunityPost,
    responses(
        (status = 201, description = "Post created", body = Post),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 403, description = "Not a member, or announcement without moderator role", body = ApiErrorBody),
        (status = 404, description = "Community not found", body = ApiErrorBody),
    ),
)]
pub async fn create_post(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<NewCommunityPost>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = state
        .service
        .create_community_post(&id, &user_id, body)
        .await?;
    Ok((StatusCode::CREATED, Json(post)))
}

// ---------------------------------------------------------------------------
// PUT/DELETE /api/v1/posts/:post_id/pin
// ---------------------------------------------------------------------------

#[utoipa::path(
    put,
    path = "/api/v1/posts/{post_id}/pin",
    tag = "Moderation",
    security(("user_id" = [])),
    params(("post_id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post pinned", body = Post),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
        (status = 422, description = "Post has no community", body = ApiErrorBody),
    ),
)]
pub async fn pin_post(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.service.pin_post(&post_id, &user_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{post_id}/pin",
    tag = "Moderation",
    security(("user_id" = [])),
    params(("post_id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post unpinned", body = Post),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
        (status = 422, description = "Post has no community", body = ApiErrorBody),
    ),
)]
pub async fn unpin_post(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.service.unpin_post(&post_id, &user_id).await?))
}

// ---------------------------------------------------------------------------
// PUT/DELETE /api/v1/posts/:post_id/announcement
// ---------------------------------------------------------------------------

#[utoipa::path(
    put,
    path = "/api/v1/posts/{post_id}/announcement",
    tag = "Moderation",
    security(("user_id" = [])),
    params(("post_id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post marked as announcement", body = Post),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
        (status = 422, description = "Post has no community", body = ApiErrorBody),
    ),
)]
pub async fn set_announcement(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.service.set_announcement(&post_id, &user_id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/posts/{post_id}/announcement",
    tag = "Moderation",
    security(("user_id" = [])),
    params(("post_id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Announcement flag cleared", body = Post),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
        (status = 422, description = "Post has no community", body = ApiErrorBody),
    ),
)]
pub async fn unset_announcement(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(
        state.service.unset_announcement(&post_id, &user_id).await?,
    ))
}

// ---------------------------------------------------------------------------
// POST /api/v1/posts/:post_id/approve
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/posts/{post_id}/approve",
    tag = "Moderation",
    security(("user_id" = [])),
    params(("post_id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post published", body = Post),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Post not found", body = ApiErrorBody),
        (status = 422, description = "Post has no community", body = ApiErrorBody),
    ),
)]
pub async fn approve_post(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.service.approve_post(&post_id, &user_id).await?))
}
