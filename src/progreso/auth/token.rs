//! Session token signing and validation.
//!
//! Tokens are stateless HS256 JWTs carrying the user id and username. There is
//! no server-side revocation list; expiry is the only lifecycle.

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub iat: usize,
    pub exp: usize,
}

/// Sign a new token for the given user.
///
/// # Errors
///
/// Returns an error if signing fails.
pub fn issue(
    secret: &SecretString,
    user_id: Uuid,
    username: &str,
    ttl_seconds: usize,
) -> Result<String> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        username: username.to_string(),
        iat: now,
        exp: now + ttl_seconds,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .context("failed to sign session token")
}

/// Validate a token and return its claims.
///
/// Any verification failure (bad signature, expired, malformed) is reported as
/// `None`; the cause is logged at debug level only.
#[must_use]
pub fn validate(secret: &SecretString, token: &str) -> Option<Claims> {
    match decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => Some(data.claims),
        Err(err) => {
            debug!("Token validation failed: {err}");
            None
        }
    }
}
