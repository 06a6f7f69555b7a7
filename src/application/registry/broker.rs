//! Log-broker registry: one admin handle per configured cluster.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::info;

use super::handle::{HandleSet, Instance};
use crate::domain::{Family, FamilyStatus};
use crate::error::{BackendError, ConnectionError};
use crate::infrastructure::config::backend::KafkaConfig;
use crate::port::{BrokerAdmin, BrokerConnector};

/// Connected broker cluster as handed to readers.
pub struct BrokerTarget {
    pub name: String,
    pub config: KafkaConfig,
    pub admin: Arc<dyn BrokerAdmin>,
}

pub struct BrokerRegistry {
    connector: Arc<dyn BrokerConnector>,
    timeout: Duration,
    handles: HandleSet<dyn BrokerAdmin, KafkaConfig>,
    config: RwLock<KafkaConfig>,
    lifecycle: Mutex<()>,
}

impl BrokerRegistry {
    pub fn new(connector: Arc<dyn BrokerConnector>, timeout: Duration) -> Self {
        Self {
            connector,
            timeout,
            handles: HandleSet::new(Family::Kafka),
            config: RwLock::new(KafkaConfig::default()),
            lifecycle: Mutex::new(()),
        }
    }

    async fn release(admins: Vec<Arc<dyn BrokerAdmin>>) {
        for admin in admins {
            admin.close().await;
        }
    }

    async fn rebuild(&self, config: &KafkaConfig) -> Result<(), ConnectionError> {
        Self::release(self.handles.drain()).await;
        *self.config.write() = config.clone();

        let instances = if config.brokers.is_empty() {
            Vec::new()
        } else {
            vec![Instance {
                name: config.name.clone(),
                meta: config.clone(),
            }]
        };
        let connector = &self.connector;
        let timeout = self.timeout;
        let outcome = self
            .handles
            .connect_all(instances, timeout, |settings| async move {
                let admin = connector.connect(&settings, timeout).await?;
                if let Err(e) = admin.ping().await {
                    admin.close().await;
                    return Err(e);
                }
                Ok::<_, BackendError>(admin)
            })
            .await;
        outcome.into_result(Family::Kafka)
    }

    /// Create the admin client and verify that metadata lists a broker.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NoInstanceReachable`] when brokers are
    /// configured and the probe failed.
    pub async fn connect(&self, config: &KafkaConfig) -> Result<(), ConnectionError> {
        let _guard = self.lifecycle.lock().await;
        self.rebuild(config).await
    }

    /// Tear down the admin client, then connect with `config`.
    ///
    /// # Errors
    ///
    /// Same as [`connect`](Self::connect).
    pub async fn reconnect(&self, config: &KafkaConfig) -> Result<(), ConnectionError> {
        let _guard = self.lifecycle.lock().await;
        info!(family = %Family::Kafka, "Reconnecting");
        self.rebuild(config).await
    }

    /// Release the admin client. Idempotent.
    pub async fn close(&self) {
        let _guard = self.lifecycle.lock().await;
        Self::release(self.handles.disconnect_all()).await;
    }

    #[must_use]
    pub fn status(&self) -> FamilyStatus {
        FamilyStatus::new(Family::Kafka, self.handles.statuses())
    }

    #[must_use]
    pub fn targets(&self) -> Vec<BrokerTarget> {
        self.handles
            .connected()
            .into_iter()
            .map(|(name, config, admin)| BrokerTarget {
                name,
                config,
                admin,
            })
            .collect()
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.handles.any_connected()
    }

    #[must_use]
    pub fn configured(&self) -> usize {
        self.handles.len()
    }

    /// Configured bootstrap brokers.
    #[must_use]
    pub fn connection_info(&self) -> Vec<String> {
        self.config.read().brokers.clone()
    }
}
