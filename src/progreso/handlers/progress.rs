//! Progress document endpoints.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use sqlx::PgPool;

use super::types::SaveResponse;
use crate::progreso::auth::AuthUser;
use crate::progreso::error::{ApiError, ErrorBody};
use crate::progreso::storage::progress;

#[utoipa::path(
    get,
    path = "/progress",
    responses(
        (status = 200, description = "Progress document for the authenticated user"),
        (status = 401, description = "Missing token", body = ErrorBody),
        (status = 403, description = "Invalid or expired token", body = ErrorBody)
    ),
    tag = "progress"
)]
pub async fn get_progress(user: AuthUser, pool: Extension<PgPool>) -> impl IntoResponse {
    match progress::get_or_init(&pool, user.0.user_id).await {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/progress",
    responses(
        (status = 200, description = "Progress saved", body = SaveResponse),
        (status = 400, description = "Empty or invalid body", body = ErrorBody),
        (status = 401, description = "Missing token", body = ErrorBody),
        (status = 403, description = "Invalid or expired token", body = ErrorBody)
    ),
    tag = "progress"
)]
pub async fn save_progress(
    user: AuthUser,
    pool: Extension<PgPool>,
    payload: Option<Json<serde_json::Value>>,
) -> impl IntoResponse {
    let data = match payload {
        Some(Json(data)) if !data.is_null() => data,
        _ => {
            return ApiError::Validation("Missing payload".to_string()).into_response();
        }
    };

    match progress::upsert(&pool, user.0.user_id, &data).await {
        Ok(()) => (StatusCode::OK, Json(SaveResponse { success: true })).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}
