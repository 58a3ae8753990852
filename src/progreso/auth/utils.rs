//! Small helpers for auth validation and rate-limit keys.

use regex::Regex;

/// Normalize a username for lookup/uniqueness checks.
///
/// Usernames are case sensitive, only surrounding whitespace is dropped.
pub(crate) fn normalize_username(username: &str) -> String {
    username.trim().to_string()
}

/// Basic username format check on already-normalized input.
pub(crate) fn valid_username(username_normalized: &str) -> bool {
    Regex::new(r"^\S{1,64}$").is_ok_and(|regex| regex.is_match(username_normalized))
}

/// Extract a client IP for rate limiting from common proxy headers.
pub(crate) fn extract_client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn normalize_username_trims_and_keeps_case() {
        assert_eq!(normalize_username("  Alice "), "Alice");
        assert_eq!(normalize_username("bob"), "bob");
    }

    #[test]
    fn valid_username_accepts_basic_names() {
        assert!(valid_username("alice"));
        assert!(valid_username("Alice-2024"));
        assert!(valid_username("a"));
        assert!(valid_username(&"x".repeat(64)));
    }

    #[test]
    fn valid_username_rejects_empty_whitespace_and_long() {
        assert!(!valid_username(""));
        assert!(!valid_username("two words"));
        assert!(!valid_username("tab\tname"));
        assert!(!valid_username(&"x".repeat(65)));
    }

    #[test]
    fn extract_client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("9.9.9.9".to_string()));
    }

    #[test]
    fn extract_client_ip_none_when_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers), None);
    }
}
