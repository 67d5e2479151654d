//! HTTP surface of the gateway, mounted under `/api/v1`

mod dto;
mod error;
mod extract;
mod rate_limit;
mod routes;
mod state;

pub use dto::validate_send;
pub use extract::{extract_api_key, ApiKeyAuth, JwtAuth};
pub use rate_limit::{client_ip, Decision, RateLimiter};
pub use routes::messages::SIGNATURE_HEADER;
pub use state::AppState;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{GatewayConfig, ServerConfig};
use crate::error::{Error, ErrorCode, Result};
use crate::registry::ConnectorRegistry;

pub const API_PREFIX: &str = "/api/v1";

/// Build the application router
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let api = Router::new()
        .route("/messages/send", post(routes::messages::send))
        .route("/messages/listmonk", post(routes::messages::listmonk))
        .route("/messages/status", get(routes::messages::status_all))
        .route("/messages/status/{platform}", get(routes::messages::status_one))
        .route("/messages/platforms", get(routes::messages::platforms))
        .route("/messages/initialize", post(routes::messages::initialize))
        .route("/health", get(routes::health))
        .route("/auth/login", post(routes::auth::login))
        .route(
            "/auth/api-keys",
            get(routes::auth::list_api_keys).post(routes::auth::create_api_key),
        )
        .route("/auth/api-keys/{key}", delete(routes::auth::revoke_api_key))
        .route("/auth/profile", get(routes::auth::profile))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit::throttle));

    Router::new()
        .nest(API_PREFIX, api)
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&server.allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods([
        Method::GET,
        Method::POST,
        Method::DELETE,
        Method::OPTIONS,
    ]);

    if allowed_origins.is_empty() || allowed_origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any).allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-api-key"),
            HeaderName::from_static(SIGNATURE_HEADER),
        ])
        .allow_credentials(true)
}

/// Serve the gateway until `shutdown` resolves
pub async fn serve(
    config: &GatewayConfig,
    registry: Arc<ConnectorRegistry>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let state = AppState::new(config, registry);
    let app = build_router(state, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        Error::new(ErrorCode::Configuration, format!("Failed to bind {addr}: {e}"))
    })?;
    info!(%addr, prefix = API_PREFIX, "Messaging gateway listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(|e| Error::new(ErrorCode::Unknown, format!("Server error: {e}")))
}
