//! Auth state and configuration.

use secrecy::SecretString;
use std::sync::Arc;

use super::rate_limit::RateLimiter;

const DEFAULT_TOKEN_TTL_SECONDS: usize = 7 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_secret: SecretString,
    frontend_base_url: String,
    token_ttl_seconds: usize,
}

impl AuthConfig {
    #[must_use]
    pub fn new(token_secret: SecretString, frontend_base_url: String) -> Self {
        Self {
            token_secret,
            frontend_base_url,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: usize) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn token_secret(&self) -> &SecretString {
        &self.token_secret
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> usize {
        self.token_ttl_seconds
    }

    pub(crate) fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    /// Only mark cookies secure when the frontend is served over HTTPS.
    pub(crate) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, rate_limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            config,
            rate_limiter,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn rate_limiter(&self) -> &dyn RateLimiter {
        self.rate_limiter.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::super::rate_limit::{
        NoopRateLimiter, RateLimitAction, RateLimitDecision, RateLimiter,
    };
    use super::{AuthConfig, AuthState};
    use secrecy::{ExposeSecret, SecretString};
    use std::sync::Arc;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new(
            SecretString::from("sekreto"),
            "https://studo.dev".to_string(),
        );

        assert_eq!(config.token_secret().expose_secret(), "sekreto");
        assert_eq!(config.frontend_base_url(), "https://studo.dev");
        assert_eq!(
            config.token_ttl_seconds(),
            super::DEFAULT_TOKEN_TTL_SECONDS
        );

        let config = config.with_token_ttl_seconds(120);
        assert_eq!(config.token_ttl_seconds(), 120);
    }

    #[test]
    fn cookie_secure_only_over_https() {
        let https = AuthConfig::new(
            SecretString::from("sekreto"),
            "https://studo.dev".to_string(),
        );
        assert!(https.session_cookie_secure());

        let http = AuthConfig::new(
            SecretString::from("sekreto"),
            "http://localhost:8080".to_string(),
        );
        assert!(!http.session_cookie_secure());
    }

    #[test]
    fn auth_state_constructs_with_noop_rate_limiter() {
        let config = AuthConfig::new(
            SecretString::from("sekreto"),
            "https://studo.dev".to_string(),
        );
        let limiter: Arc<dyn RateLimiter> = Arc::new(NoopRateLimiter);
        let state = AuthState::new(config, limiter);

        assert_eq!(
            state
                .rate_limiter()
                .check_ip(Some("1.2.3.4"), RateLimitAction::Login),
            RateLimitDecision::Allowed
        );
        assert_eq!(state.config().frontend_base_url(), "https://studo.dev");
    }
}
