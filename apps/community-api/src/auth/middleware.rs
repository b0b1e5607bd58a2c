//! Caller identity extraction.
//!
//! Authentication happens upstream; the gateway forwards the verified user
//! id in the `X-User-Id` header.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Authenticated user taken from the `X-User-Id` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
}

/// Caller identity when the endpoint also serves anonymous requests.
#[derive(Debug, Clone)]
pub struct MaybeUser {
    pub user_id: Option<String>,
}

/// Rejection returned when the identity header is missing or malformed.
pub struct AuthError {
    message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": {
                "code": "UNAUTHORIZED",
                "message": self.message
            }
        });
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

fn header_user_id(parts: &Parts) -> Result<Option<String>, AuthError> {
    let Some(value) = parts.headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let user_id = value
        .to_str()
        .map(str::trim)
        .map_err(|_| AuthError {
            message: "Invalid X-User-Id header",
        })?;
    if user_id.is_empty() {
        return Err(AuthError {
            message: "Invalid X-User-Id header",
        });
    }
    Ok(Some(user_id.to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = header_user_id(parts)?.ok_or(AuthError {
            message: "Missing X-User-Id header",
        })?;
        Ok(AuthUser { user_id })
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser {
            user_id: header_user_id(parts)?,
        })
    }
}
