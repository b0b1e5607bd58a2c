//! Community lifecycle and discovery endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::middleware::AuthUser;
use crate::error::{ApiError, ApiErrorBody, FieldError};
use crate::models::community::{Community, CommunityChanges, CommunityType};
use crate::service::CreateCommunity;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/communities",
            get(list_communities).post(create_community),
        )
        .route("/communities/global", get(get_global_community))
        .route("/communities/mine", get(list_my_communities))
        .route(
            "/communities/{id}",
            get(get_community).patch(update_community),
        )
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListCommunitiesResponse {
    pub data: Vec<Community>,
}

// ---------------------------------------------------------------------------
// POST /api/v1/communities
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCommunityRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub community_type: CommunityType,
    pub organization_id: Option<String>,
    #[serde(default)]
    pub require_approval: bool,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<serde_json::Value>,
}

#[utoipa::path(
    post,
    path = "/api/v1/communities",
    tag = "Communities",
    request_body = CreateCommunityRequest,
    responses(
        (status = 201, description = "Community created", body = Community),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn create_community(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<CreateCommunityRequest>,
) -> Result<(StatusCode, Json<Community>), ApiError> {
    let community = state
        .service
        .create_community(CreateCommunity {
            name: body.name,
            description: body.description,
            community_type: body.community_type,
            owner_user_id: user_id,
            organization_id: body.organization_id,
            require_approval: body.require_approval,
            metadata: body.metadata,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(community)))
}

// ---------------------------------------------------------------------------
// GET /api/v1/communities?type=
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCommunitiesQuery {
    #[serde(rename = "type")]
    pub community_type: Option<CommunityType>,
}

#[utoipa::path(
    get,
    path = "/api/v1/communities",
    tag = "Communities",
    params(ListCommunitiesQuery),
    responses(
        (status = 200, description = "Communities of the type, newest first", body = ListCommunitiesResponse),
        (status = 400, description = "Missing type", body = ApiErrorBody),
    ),
)]
pub async fn list_communities(
    State(state): State<AppState>,
    Query(query): Query<ListCommunitiesQuery>,
) -> Result<Json<ListCommunitiesResponse>, ApiError> {
    let community_type = query.community_type.ok_or_else(|| {
        ApiError::validation(vec![FieldError {
            field: "type".to_string(),
            message: "Community type is required".to_string(),
        }])
    })?;

    let data = state.service.list_communities_by_type(community_type).await?;
    Ok(Json(ListCommunitiesResponse { data }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/communities/global
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/communities/global",
    tag = "Communities",
    responses((status = 200, description = "The global community", body = Community)),
)]
pub async fn get_global_community(
    State(state): State<AppState>,
) -> Result<Json<Community>, ApiError> {
    Ok(Json(state.service.ensure_global_community().await?))
}

// ---------------------------------------------------------------------------
// GET /api/v1/communities/mine
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/communities/mine",
    tag = "Communities",
    security(("user_id" = [])),
    responses(
        (status = 200, description = "Communities visible to the caller", body = ListCommunitiesResponse),
        (status = 401, description = "Unauthorized", body = ApiErrorBody),
    ),
)]
pub async fn list_my_communities(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ListCommunitiesResponse>, ApiError> {
    let data = state.service.list_my_communities(&user_id).await?;
    Ok(Json(ListCommunitiesResponse { data }))
}

// ---------------------------------------------------------------------------
// GET /api/v1/communities/:id
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/communities/{id}",
    tag = "Communities",
    params(("id" = String, Path, description = "Community ID")),
    responses(
        (status = 200, description = "Community", body = Community),
        (status = 404, description = "Community not found", body = ApiErrorBody),
    ),
)]
pub async fn get_community(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Community>, ApiError> {
    let community = state
        .service
        .get_community(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Community not found"))?;

    Ok(Json(community))
}

// ---------------------------------------------------------------------------
// PATCH /api/v1/communities/:id
// ---------------------------------------------------------------------------

#[utoipa::path(
    patch,
    path = "/api/v1/communities/{id}",
    tag = "Communities",
    security(("user_id" = [])),
    params(("id" = String, Path, description = "Community ID")),
    request_body = CommunityChanges,
    responses(
        (status = 200, description = "Community updated", body = Community),
        (status = 400, description = "Validation error", body = ApiErrorBody),
        (status = 403, description = "Forbidden", body = ApiErrorBody),
        (status = 404, description = "Community not found", body = ApiErrorBody),
    ),
)]
pub async fn update_community(
    AuthUser { user_id }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CommunityChanges>,
) -> Result<Json<Community>, ApiError> {
    let community = state
        .service
        .update_community_settings(&id, &user_id, body)
        .await?;

    Ok(Json(community))
}
