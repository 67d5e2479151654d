//! Connector registry
//!
//! Maps each platform to its connector. Built once at startup and read-only
//! afterwards; bulk operations fan out over every registered connector.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{error, info, warn};

use crate::config::GatewayConfig;
use crate::error::{Error, ErrorCode, Result};
use crate::platforms::{Connector, SlackConnector, WhatsappConnector};
use crate::types::{ConnectorStatus, Platform};

/// Read-only map from platform to connector
pub struct ConnectorRegistry {
    connectors: BTreeMap<Platform, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    /// Build a registry from connectors; a later connector for the same
    /// platform replaces an earlier one
    pub fn new(connectors: Vec<Arc<dyn Connector>>) -> Self {
        let connectors = connectors
            .into_iter()
            .map(|connector| (connector.platform(), connector))
            .collect();
        Self { connectors }
    }

    /// Registry with one connector per supported platform
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(vec![
            Arc::new(WhatsappConnector::new(config.whatsapp.clone())),
            Arc::new(SlackConnector::new(config.slack.clone())),
        ])
    }

    /// Connector registered for `platform`
    pub fn lookup(&self, platform: Platform) -> Result<Arc<dyn Connector>> {
        self.connectors
            .get(&platform)
            .cloned()
            .ok_or_else(|| {
                Error::new(ErrorCode::NotFound, format!("Platform {platform} is not supported"))
                    .with_platform(platform)
            })
    }

    /// Registered platforms, in a stable order
    pub fn platforms(&self) -> Vec<Platform> {
        self.connectors.keys().copied().collect()
    }

    pub fn connectors(&self) -> Vec<Arc<dyn Connector>> {
        self.connectors.values().cloned().collect()
    }

    /// Initialize every connector concurrently
    ///
    /// Each connector initializes in its own task. The first failure is
    /// returned as soon as it is observed; the remaining tasks keep running
    /// and connectors that succeed stay initialized.
    pub async fn initialize_all(&self) -> Result<()> {
        info!(platforms = ?self.platforms(), "Initializing all connectors");

        let mut tasks: FuturesUnordered<_> = self
            .connectors
            .values()
            .map(|connector| {
                let connector = Arc::clone(connector);
                tokio::spawn(async move {
                    let platform = connector.platform();
                    connector.initialize().await.map_err(|e| e.with_platform(platform))
                })
            })
            .collect();

        while let Some(joined) = tasks.next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(platform = ?e.platform(), error = %e, "Connector initialization failed");
                    return Err(e);
                }
                Err(e) => {
                    error!(error = %e, "Connector initialization task panicked");
                    return Err(Error::new(
                        ErrorCode::Unknown,
                        format!("Connector initialization task failed: {e}"),
                    ));
                }
            }
        }

        info!("All connectors initialized");
        Ok(())
    }

    /// Status of every connector; a failing status call yields a degraded entry
    pub async fn status_all(&self) -> BTreeMap<Platform, ConnectorStatus> {
        let statuses = join_all(self.connectors.iter().map(|(platform, connector)| async move {
            (*platform, Self::status_or_degraded(*platform, connector.as_ref()).await)
        }))
        .await;
        statuses.into_iter().collect()
    }

    /// Status of one platform, degraded when it is unknown or its status fails
    pub async fn status_of(&self, platform: Platform) -> ConnectorStatus {
        match self.lookup(platform) {
            Ok(connector) => Self::status_or_degraded(platform, connector.as_ref()).await,
            Err(e) => ConnectorStatus::degraded(platform, e.message),
        }
    }

    /// Destroy every connector concurrently; never fails
    pub async fn destroy_all(&self) {
        info!("Destroying all connectors");
        join_all(self.connectors.values().map(|connector| connector.destroy())).await;
    }

    async fn status_or_degraded(platform: Platform, connector: &dyn Connector) -> ConnectorStatus {
        match connector.get_status().await {
            Ok(status) => status,
            Err(e) => {
                warn!(%platform, error = %e, "Failed to read connector status");
                ConnectorStatus::degraded(platform, e.message)
            }
        }
    }
}
