//! Authentication building blocks.
//!
//! This module covers password hashing, signed session tokens, the extractor
//! that guards protected routes, and rate limiting for the public auth
//! endpoints.
//!
//! ## Sessions
//!
//! Sessions are stateless: a login issues an HMAC-signed token that carries the
//! user id and username, delivered both in the response body and as an
//! `HttpOnly` cookie. Logout clears the cookie; the token itself stays valid
//! until it expires.
//!
//! > **Warning:** Rotating the signing secret invalidates all outstanding
//! > sessions.

pub(crate) mod password;
pub(crate) mod rate_limit;
pub(crate) mod session;
mod state;
pub(crate) mod token;
pub(crate) mod utils;

pub use rate_limit::{NoopRateLimiter, RateLimiter, SlidingWindowRateLimiter};
pub use session::{AuthUser, Identity};
pub use state::{AuthConfig, AuthState};
