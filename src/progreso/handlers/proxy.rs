//! Proxy endpoints for CMS content and remote images.
//!
//! The frontend is served from one origin; these endpoints fetch the lecture
//! catalog and lecture images on its behalf so browser same-origin and CSP
//! rules stay simple. Upstream failures surface as `upstream_error` without
//! leaking upstream details.

use anyhow::{anyhow, Context, Result};
use axum::{
    extract::{Extension, Query},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::progreso::error::{ApiError, ErrorBody};
use crate::progreso::APP_USER_AGENT;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);

/// Upstream targets the proxies may talk to.
#[derive(Debug)]
pub struct ProxyState {
    client: reqwest::Client,
    content_url: Option<String>,
    image_hosts: Option<Vec<String>>,
}

impl ProxyState {
    /// Build the proxy state with a shared HTTP client.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(content_url: Option<String>, image_hosts: Option<Vec<String>>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(UPSTREAM_TIMEOUT)
            .build()
            .context("failed to build proxy HTTP client")?;
        Ok(Self {
            client,
            content_url,
            image_hosts,
        })
    }

    fn host_allowed(&self, host: &str) -> bool {
        // No allowlist configured means any host is fair game.
        self.image_hosts
            .as_ref()
            .is_none_or(|hosts| hosts.iter().any(|allowed| allowed == host))
    }
}

#[derive(Deserialize, Debug)]
pub struct ImageQuery {
    url: String,
}

#[utoipa::path(
    get,
    path = "/content",
    responses(
        (status = 200, description = "Upstream CMS payload"),
        (status = 404, description = "No content upstream configured"),
        (status = 502, description = "Upstream request failed", body = ErrorBody)
    ),
    tag = "proxy"
)]
pub async fn content(proxy: Extension<Arc<ProxyState>>) -> impl IntoResponse {
    // An unconfigured upstream answers like an unknown route.
    let Some(url) = proxy.content_url.clone() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match fetch(&proxy.client, &url).await {
        Ok((content_type, body)) => proxied_response(content_type, body),
        Err(err) => ApiError::Upstream(err).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/image",
    params(
        ("url" = String, Query, description = "Absolute image URL to fetch")
    ),
    responses(
        (status = 200, description = "Image bytes with the upstream content type"),
        (status = 400, description = "Missing, invalid, or disallowed URL", body = ErrorBody),
        (status = 502, description = "Upstream request failed", body = ErrorBody)
    ),
    tag = "proxy"
)]
pub async fn image(
    proxy: Extension<Arc<ProxyState>>,
    query: Option<Query<ImageQuery>>,
) -> impl IntoResponse {
    let Some(Query(ImageQuery { url })) = query else {
        return ApiError::Validation("Missing url".to_string()).into_response();
    };

    let Ok(parsed) = Url::parse(&url) else {
        return ApiError::Validation("Invalid url".to_string()).into_response();
    };
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return ApiError::Validation("Invalid url".to_string()).into_response();
    }
    let Some(host) = parsed.host_str() else {
        return ApiError::Validation("Invalid url".to_string()).into_response();
    };
    if !proxy.host_allowed(host) {
        return ApiError::Validation("Image host not allowed".to_string()).into_response();
    }

    match fetch(&proxy.client, parsed.as_str()).await {
        Ok((content_type, body)) => proxied_response(content_type, body),
        Err(err) => ApiError::Upstream(err).into_response(),
    }
}

async fn fetch(client: &reqwest::Client, url: &str) -> Result<(Option<HeaderValue>, Vec<u8>)> {
    let response = client
        .get(url)
        .send()
        .await
        .context("upstream request failed")?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("upstream returned {status}"));
    }

    let content_type = response.headers().get(CONTENT_TYPE).cloned();
    let body = response
        .bytes()
        .await
        .context("failed to read upstream body")?
        .to_vec();
    Ok((content_type, body))
}

fn proxied_response(content_type: Option<HeaderValue>, body: Vec<u8>) -> axum::response::Response {
    let mut headers = HeaderMap::new();
    if let Some(content_type) = content_type {
        headers.insert(CONTENT_TYPE, content_type);
    }
    (StatusCode::OK, headers, body).into_response()
}
