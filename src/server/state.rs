use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthService;
use crate::config::GatewayConfig;
use crate::dispatch::DispatchService;
use crate::health::HealthAggregator;
use crate::registry::ConnectorRegistry;

use super::rate_limit::RateLimiter;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ConnectorRegistry>,
    pub dispatch: Arc<DispatchService>,
    pub health: Arc<HealthAggregator>,
    pub auth: Arc<AuthService>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: &GatewayConfig, registry: Arc<ConnectorRegistry>) -> Self {
        Self {
            dispatch: Arc::new(DispatchService::new(Arc::clone(&registry))),
            health: Arc::new(HealthAggregator::new(
                Arc::clone(&registry),
                Duration::from_millis(config.health.status_timeout_ms),
            )),
            auth: Arc::new(AuthService::new(config.auth.clone())),
            limiter: Arc::new(RateLimiter::new(
                config.throttle.limit,
                Duration::from_millis(config.throttle.ttl_ms),
            )),
            registry,
        }
    }
}
