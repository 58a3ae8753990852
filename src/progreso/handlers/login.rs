//! Login and logout endpoints.

use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::types::{LoginRequest, LoginResponse, UserSummary};
use crate::progreso::auth::rate_limit::{RateLimitAction, RateLimitDecision};
use crate::progreso::auth::session::{clear_session_cookie, session_cookie};
use crate::progreso::auth::utils::{extract_client_ip, normalize_username};
use crate::progreso::auth::{password, token, AuthState};
use crate::progreso::error::{ApiError, ErrorBody};
use crate::progreso::storage::users;

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 429, description = "Rate limited", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => {
            return ApiError::Validation("Missing payload".to_string()).into_response();
        }
    };

    let client_ip = extract_client_ip(&headers);
    if auth_state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::Login)
        == RateLimitDecision::Limited
    {
        return ApiError::RateLimited.into_response();
    }

    // Unknown users and wrong passwords share one response so the endpoint
    // cannot be used to probe for accounts.
    let username = normalize_username(&request.username);
    let user = match users::find_by_username(&pool, &username).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return ApiError::Unauthorized("invalid credentials".to_string()).into_response();
        }
        Err(err) => return ApiError::from(err).into_response(),
    };

    match password::verify(user.password_hash, request.password).await {
        Ok(true) => {}
        Ok(false) => {
            return ApiError::Unauthorized("invalid credentials".to_string()).into_response();
        }
        Err(err) => return ApiError::from(err).into_response(),
    }

    let config = auth_state.config();
    let token = match token::issue(
        config.token_secret(),
        user.id,
        &user.username,
        config.token_ttl_seconds(),
    ) {
        Ok(token) => token,
        Err(err) => return ApiError::from(err).into_response(),
    };

    let mut response_headers = HeaderMap::new();
    match session_cookie(config, &token) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => {
            error!("Failed to build session cookie: {err}");
        }
    }

    let response = LoginResponse {
        token,
        user: UserSummary {
            id: user.id.to_string(),
            username: user.username,
        },
    };
    (StatusCode::OK, response_headers, Json(response)).into_response()
}

#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Sessions are stateless, so there is nothing to revoke server side.
    // Always clear the cookie, even when the request carried no session.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(auth_state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}
