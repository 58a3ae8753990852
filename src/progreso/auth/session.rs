//! Session guard for cookie and bearer auth.

use axum::{
    extract::{Extension, FromRequestParts},
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
};
use std::sync::Arc;
use uuid::Uuid;

use super::state::{AuthConfig, AuthState};
use super::token;
use crate::progreso::error::ApiError;

pub(crate) const SESSION_COOKIE_NAME: &str = "progreso_token";

/// Authenticated identity attached to protected requests.
#[derive(Clone, Debug)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
}

/// Extractor gating protected routes.
///
/// Missing token maps to 401, an invalid or expired one to 403.
pub struct AuthUser(pub Identity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(auth_state): Extension<Arc<AuthState>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|err| ApiError::Unavailable(anyhow::anyhow!(err)))?;

        let Some(raw) = extract_session_token(&parts.headers) else {
            return Err(ApiError::Unauthorized("missing token".to_string()));
        };

        let claims = token::validate(auth_state.config().token_secret(), &raw)
            .ok_or_else(|| ApiError::Forbidden("invalid or expired token".to_string()))?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::Forbidden("invalid or expired token".to_string()))?;

        Ok(Self(Identity {
            user_id,
            username: claims.username,
        }))
    }
}

/// Build a secure `HttpOnly` cookie for the session token.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.token_ttl_seconds();
    let secure = config.session_cookie_secure();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let secure = config.session_cookie_secure();
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Pull the session token from the `Authorization` header or the cookie.
/// The bearer header wins when both are present.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = extract_bearer_token(headers) {
        return Some(token);
    }
    let header = headers.get(COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let Some(key) = parts.next() else { continue };
        let Some(val) = parts.next() else { continue };
        if key.trim() == SESSION_COOKIE_NAME {
            return Some(val.trim().to_string());
        }
    }
    None
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
