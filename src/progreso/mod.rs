#![allow(clippy::needless_for_each)]

use crate::progreso::handlers::{
    health, health::__path_health,
    login::{__path_login, __path_logout},
    progress::{__path_get_progress, __path_save_progress},
    proxy::{__path_content, __path_image},
    register::__path_register,
    types,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, sync::mpsc};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error;
pub(crate) mod handlers;
pub(crate) mod storage;

use auth::{AuthConfig, AuthState, RateLimiter, SlidingWindowRateLimiter};
use error::ErrorBody;
use handlers::ProxyState;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        register,
        login,
        logout,
        get_progress,
        save_progress,
        content,
        image
    ),
    components(schemas(
        health::Health,
        types::RegisterRequest,
        types::RegisterResponse,
        types::LoginRequest,
        types::LoginResponse,
        types::UserSummary,
        types::SaveResponse,
        ErrorBody
    )),
    tags(
        (name = "auth", description = "Registration, login, and session endpoints"),
        (name = "progress", description = "Per-user study progress documents"),
        (name = "proxy", description = "CMS content and image proxies"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    auth_config: AuthConfig,
    content_url: Option<String>,
    image_hosts: Option<Vec<String>>,
) -> Result<()> {
    // Gracefully shutdown when a termination signal arrives
    let (tx, mut rx) = mpsc::unbounded_channel();

    watch_shutdown_signals(tx);

    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .acquire_timeout(Duration::from_secs(5))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let app = router(pool, auth_config, content_url, image_hosts)?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async move {
            rx.recv().await;
            info!("Gracefully shutdown");
        })
        .await?;

    Ok(())
}

/// Build the application router.
///
/// # Errors
/// Returns an error if the frontend URL or proxy configuration is invalid.
pub fn router(
    pool: PgPool,
    auth_config: AuthConfig,
    content_url: Option<String>,
    image_hosts: Option<Vec<String>>,
) -> Result<Router> {
    // Cookies require a concrete allowed origin, never a wildcard.
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(AllowOrigin::exact(frontend_origin(
            auth_config.frontend_base_url(),
        )?))
        .allow_credentials(true);

    let rate_limiter: Arc<dyn RateLimiter> = Arc::new(SlidingWindowRateLimiter::default());
    let auth_state = Arc::new(AuthState::new(auth_config, rate_limiter));
    let proxy_state = Arc::new(ProxyState::new(content_url, image_hosts)?);

    let app = Router::new()
        .route("/", get(|| async { "📚" }))
        .route("/register", post(handlers::register::register))
        .route("/login", post(handlers::login::login))
        .route("/logout", post(handlers::login::logout))
        .route(
            "/progress",
            get(handlers::progress::get_progress).post(handlers::progress::save_progress),
        )
        .route("/content", get(handlers::proxy::content))
        .route("/image", get(handlers::proxy::image))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth_state))
                .layer(Extension(proxy_state))
                .layer(Extension(pool.clone())),
        )
        .route(
            "/health",
            get(handlers::health::health).options(handlers::health::health),
        )
        .layer(Extension(pool))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    Ok(app)
}

fn frontend_origin(frontend_base_url: &str) -> Result<HeaderValue> {
    let url = Url::parse(frontend_base_url).context("Invalid frontend URL")?;
    let origin = url.origin().ascii_serialization();
    HeaderValue::from_str(&origin).context("Invalid frontend origin")
}

fn watch_shutdown_signals(tx: mpsc::UnboundedSender<()>) {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {err}");
            }
        };

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        () = ctrl_c => {},
                        _ = sigterm.recv() => {},
                    }
                }
                Err(err) => {
                    // Keep serving; ctrl-c still triggers shutdown.
                    error!("Failed to listen for SIGTERM: {err}");
                    ctrl_c.await;
                }
            }
        }

        #[cfg(not(unix))]
        ctrl_c.await;

        let _ = tx.send(());
    });
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontend_origin_strips_path() -> Result<()> {
        let origin = frontend_origin("http://localhost:8080/app/index.html")?;
        assert_eq!(origin.to_str()?, "http://localhost:8080");
        Ok(())
    }

    #[test]
    fn frontend_origin_keeps_non_default_port() -> Result<()> {
        let origin = frontend_origin("https://studo.dev:8443/")?;
        assert_eq!(origin.to_str()?, "https://studo.dev:8443");
        Ok(())
    }

    #[test]
    fn frontend_origin_rejects_garbage() {
        assert!(frontend_origin("not a url").is_err());
    }

    #[test]
    fn openapi_lists_routes() {
        let doc = openapi();
        for path in [
            "/health", "/register", "/login", "/logout", "/progress", "/content", "/image",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing path {path}");
        }
    }

    #[test]
    fn user_agent_carries_version() {
        assert!(APP_USER_AGENT.starts_with("progreso/"));
    }
}
