//! Membership endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody};
use crate::models::membership::{MemberRole, Membership};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/communities/{id}/members", get(list_members))
        .route(
            "/communities/{id}/members/@me",
            put(join_community).delete(leave_community),
        )
        .route("/communities/{id}/members/{user_id}", put(add_member))
        .route("/communities/{id}/members/{user_id}/role", get(get_member_role))
}

#[derive(Debug, Deserialize)]
pub struct MemberPath {
    pub id: String,
    pub user_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListMembersResponse {
    pub data: Vec<Membership>,
}

// ---------------------------------------------------------------------------
// GET /api/v1/communities/:id/members
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/communities/{id}/members",
    tag = "Members",
    params(("id" = String, Path, description = "Community ID")),
    responses(
        (status = 200, description = "Members in join order", body = ListMembersResponse),
        (status = 404, description = "Community not found", body = ApiErrorBody),
    ),
)]
pub async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ListMembersResponse>, ApiError> {
    if state.service.get_community(&id).await?.is_none() {
        return Err(ApiError::not_found("Community not found"));
    }
    let data = state.service.get_community_members(&id).await?;
    Ok(Json(ListMembersResponse { data }))
}

// ---------------------------------------------------------------------------
// PUT /api/v1/communities/:id/members/@me
// ---------------------------------------------------------------------------

#[utoipa::path(
    put,
    path = "/api/v1/communities/{id}/members/@me",
    tag = "Members",
    security(("user_id" = [])),
    params(("id" = String, Path, description = "Community ID")),
    responses(
        (status = 201, description = "Joined", body = Membership),
        (status = 404, description = "Community not found", body = ApiErrorBody),
        (status = 409, description = "Already a member", body = ApiErrorBody),
    ),
)]
pub async fn join_community(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Membership>), ApiError> {
    let membership = state
        .service
        .join_community(&id, &user_id, MemberRole::Member)
        .await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

// ---------------------------------------------------------------------------
// DELETE /api/v1/communities/:id/members/@me
// ---------------------------------------------------------------------------

#[utoipa::path(
    delete,
    path = "/api/v1/communities/{id}/members/@me",
    tag = "Members",
    security(("user_id" = [])),
    params(("id" = String, Path, description = "Community ID")),
    responses(
        (status = 204, description = "Left the community"),
        (status = 403, description = "Owners cannot leave", body = ApiErrorBody),
        (status = 404, description = "Not a member", body = ApiErrorBody),
    ),
)]
pub async fn leave_community(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.leave_community(&id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// PUT /api/v1/communities/:id/members/:user_id
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddMemberRequest {
    #[serde(default)]
    pub role: MemberRole,
}

#[utoipa::path(
    put,
    path = "/api/v1/communities/{id}/members/{user_id}",
    tag = "Members",
    security(("user_id" = [])),
    params(
        ("id" = String, Path, description = "Community ID"),
        ("user_id" = String, Path, description = "User to add"),
    ),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = Membership),
        (status = 400, description = "Owner role requested", body = ApiErrorBody),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 409, description = "Already a member", body = ApiErrorBody),
    ),
)]
pub async fn add_member(
    AuthUser { user_id: actor_id }: AuthUser,
    State(state): State<AppState>,
    Path(path): Path<MemberPath>,
    Json(body): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<Membership>), ApiError> {
    let membership = state
        .service
        .add_member(&path.id, &actor_id, &path.user_id, body.role)
        .await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

// ---------------------------------------------------------------------------
// GET /api/v1/communities/:id/members/:user_id/role
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, ToSchema)]
pub struct MemberRoleResponse {
    pub is_member: bool,
    pub role: Option<MemberRole>,
}

#[utoipa::path(
    get,
    path = "/api/v1/communities/{id}/members/{user_id}/role",
    tag = "Members",
    params(
        ("id" = String, Path, description = "Community ID"),
        ("user_id" = String, Path, description = "User ID"),
    ),
    responses((status = 200, description = "Role of the user, if any", body = MemberRoleResponse)),
)]
pub async fn get_member_role(
    State(state): State<AppState>,
    Path(path): Path<MemberPath>,
) -> Result<Json<MemberRoleResponse>, ApiError> {
    let role = state.service.get_user_role(&path.id, &path.user_id).await?;
    Ok(Json(MemberRoleResponse {
        is_member: role.is_some(),
        role,
    }))
}
