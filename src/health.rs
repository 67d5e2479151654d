//! Health aggregation across connectors

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::registry::ConnectorRegistry;
use crate::types::{timestamp_now, Platform};

lazy_static::lazy_static! {
    /// Process start, for uptime reporting
    static ref STARTED_AT: Instant = Instant::now();
}

/// Seconds since the process started (first use of this module)
pub fn uptime_secs() -> f64 {
    STARTED_AT.elapsed().as_secs_f64()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Connectivity flag per platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub whatsapp: bool,
    pub slack: bool,
}

impl ServiceHealth {
    fn set(&mut self, platform: Platform, connected: bool) {
        match platform {
            Platform::Whatsapp => self.whatsapp = connected,
            Platform::Slack => self.slack = connected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Uptime in seconds
    pub uptime: f64,
    pub timestamp: String,
    pub services: ServiceHealth,
}

impl HealthReport {
    fn unhealthy() -> Self {
        HealthReport {
            status: HealthStatus::Unhealthy,
            uptime: uptime_secs(),
            timestamp: timestamp_now(),
            services: ServiceHealth::default(),
        }
    }
}

pub struct HealthAggregator {
    registry: Arc<ConnectorRegistry>,
    status_timeout: Duration,
}

impl HealthAggregator {
    pub fn new(registry: Arc<ConnectorRegistry>, status_timeout: Duration) -> Self {
        lazy_static::initialize(&STARTED_AT);
        Self { registry, status_timeout }
    }

    /// Healthy iff every registered connector is connected; never fails
    pub async fn check(&self) -> HealthReport {
        let statuses = match tokio::time::timeout(self.status_timeout, self.registry.status_all()).await {
            Ok(statuses) => statuses,
            Err(_) => {
                error!(timeout_ms = self.status_timeout.as_millis() as u64, "Health check timed out");
                return HealthReport::unhealthy();
            }
        };

        let mut services = ServiceHealth::default();
        for (platform, status) in &statuses {
            services.set(*platform, status.is_connected);
        }
        let healthy = statuses.values().all(|status| status.is_connected);

        HealthReport {
            status: if healthy {
                HealthStatus::Healthy
            } else {
                HealthStatus::Unhealthy
            },
            uptime: uptime_secs(),
            timestamp: timestamp_now(),
            services,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeConnector;

    fn aggregator(connectors: Vec<Arc<dyn crate::platforms::Connector>>) -> HealthAggregator {
        HealthAggregator::new(Arc::new(ConnectorRegistry::new(connectors)), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_all_connected_is_healthy() {
        let health = aggregator(vec![
            Arc::new(FakeConnector::connected(Platform::Whatsapp)),
            Arc::new(FakeConnector::connected(Platform::Slack)),
        ]);
        let report = health.check().await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.services, ServiceHealth { whatsapp: true, slack: true });
        assert!(report.uptime >= 0.0);
    }

    #[tokio::test]
    async fn test_one_disconnected_is_unhealthy() {
        let health = aggregator(vec![
            Arc::new(FakeConnector::new(Platform::Whatsapp)),
            Arc::new(FakeConnector::connected(Platform::Slack)),
        ]);
        let report = health.check().await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(!report.services.whatsapp);
        assert!(report.services.slack);
    }

    #[tokio::test]
    async fn test_failing_status_counts_as_disconnected() {
        let health = aggregator(vec![
            Arc::new(FakeConnector::connected(Platform::Whatsapp)),
            Arc::new(FakeConnector::connected(Platform::Slack).failing_status("boom")),
        ]);
        let report = health.check().await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(report.services.whatsapp);
        assert!(!report.services.slack);
    }

    #[test]
    fn test_report_serialization() {
        let report = HealthReport::unhealthy();
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], "unhealthy");
        assert_eq!(value["services"]["whatsapp"], false);
        assert!(value["uptime"].is_number());
    }
}
