//! Account registration endpoint.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;

use super::types::{RegisterRequest, RegisterResponse};
use crate::progreso::auth::rate_limit::{RateLimitAction, RateLimitDecision};
use crate::progreso::auth::utils::{extract_client_ip, normalize_username, valid_username};
use crate::progreso::auth::{password, AuthState};
use crate::progreso::error::{ApiError, ErrorBody};
use crate::progreso::storage::devices;
use crate::progreso::storage::registration::{self, RegisterOutcome};

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 403, description = "Device already bound to an account", body = ErrorBody),
        (status = 409, description = "Username taken", body = ErrorBody),
        (status = 429, description = "Rate limited", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn register(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return ApiError::Validation("Missing payload".to_string()).into_response();
        }
    };

    let username = normalize_username(&request.username);
    if !valid_username(&username) {
        return ApiError::Validation("Invalid username".to_string()).into_response();
    }
    if request.password.is_empty() {
        return ApiError::Validation("Missing password".to_string()).into_response();
    }
    let device_id = request.device_id.trim().to_string();
    if device_id.is_empty() {
        return ApiError::Validation("Missing device id".to_string()).into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if auth_state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::Register)
        == RateLimitDecision::Limited
    {
        return ApiError::RateLimited.into_response();
    }

    // Cheap pre-check before the expensive password hash; the unique
    // constraint still catches devices that race past it.
    match devices::is_registered(&pool, &device_id).await {
        Ok(true) => {
            return ApiError::Forbidden("device already used".to_string()).into_response();
        }
        Ok(false) => {}
        Err(err) => return ApiError::from(err).into_response(),
    }

    let password_hash = match password::hash(request.password).await {
        Ok(hash) => hash,
        Err(err) => return ApiError::from(err).into_response(),
    };

    match registration::create_account(&pool, &username, &password_hash, &device_id).await {
        Ok(RegisterOutcome::Created(user)) => (
            StatusCode::CREATED,
            Json(RegisterResponse {
                id: user.id.to_string(),
                username: user.username,
            }),
        )
            .into_response(),
        Ok(RegisterOutcome::UsernameConflict) => {
            ApiError::Conflict("username taken".to_string()).into_response()
        }
        Ok(RegisterOutcome::DeviceConflict) => {
            ApiError::Forbidden("device already used".to_string()).into_response()
        }
        Err(err) => ApiError::from(err).into_response(),
    }
}
