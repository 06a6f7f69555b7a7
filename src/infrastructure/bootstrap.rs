//! Composition root: connectors, registries and services wired together.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::adapter::outbound::kafka::KafkaConnector;
use crate::adapter::outbound::redis::RedisConnector;
use crate::adapter::outbound::sql::{MySqlConnector, PostgresConnector};
use crate::application::registry::{BrokerRegistry, KeyValueRegistry, RelationalRegistry};
use crate::application::{
    ClusterTopologyAnalyzer, MetricsAggregator, RealtimeBroadcaster, ReconnectOnChange, Registries,
    ReloadCoordinator,
};
use crate::domain::Family;
use crate::error::ConnectionError;
use crate::infrastructure::config::settings::Settings;
use crate::infrastructure::config::ConfigStore;
use crate::infrastructure::watcher::ConfigWatcher;
use crate::port::{BrokerConnector, KeyValueConnector, RelationalConnector};

/// One connector per backend family.
#[derive(Clone)]
pub struct Connectors {
    pub key_value: Arc<dyn KeyValueConnector>,
    pub broker: Arc<dyn BrokerConnector>,
    pub postgres: Arc<dyn RelationalConnector>,
    pub mysql: Arc<dyn RelationalConnector>,
}

impl Connectors {
    /// Connectors that talk to real backends.
    #[must_use]
    pub fn live() -> Self {
        Self {
            key_value: Arc::new(RedisConnector),
            broker: Arc::new(KafkaConnector),
            postgres: Arc::new(PostgresConnector),
            mysql: Arc::new(MySqlConnector),
        }
    }
}

/// Everything a running monitor needs, built once at startup.
pub struct AppContext {
    pub settings: Settings,
    pub store: Arc<ConfigStore>,
    pub registries: Registries,
    pub aggregator: Arc<MetricsAggregator>,
    pub analyzer: ClusterTopologyAnalyzer,
    pub broadcaster: Arc<RealtimeBroadcaster>,
    pub coordinator: Arc<ReloadCoordinator>,
}

impl AppContext {
    /// Wire the services. Nothing connects until [`connect_all`](Self::connect_all).
    #[must_use]
    pub fn new(settings: Settings, store: Arc<ConfigStore>, connectors: Connectors) -> Self {
        let timing = &settings.monitoring;
        let timeout = timing.request_timeout();

        let registries = Registries {
            key_value: Arc::new(KeyValueRegistry::new(Arc::clone(&connectors.key_value), timeout)),
            broker: Arc::new(BrokerRegistry::new(connectors.broker, timeout)),
            postgres: Arc::new(RelationalRegistry::new(
                Family::PostgreSql,
                connectors.postgres,
                timeout,
            )),
            mysql: Arc::new(RelationalRegistry::new(Family::MySql, connectors.mysql, timeout)),
        };
        let aggregator = Arc::new(MetricsAggregator::new(registries.clone(), timeout));
        let analyzer = ClusterTopologyAnalyzer::new(connectors.key_value, timeout);
        let broadcaster = Arc::new(RealtimeBroadcaster::new(
            aggregator.clone(),
            timing.broadcast_interval(),
            timing.delivery_timeout(),
        ));

        let coordinator = Arc::new(ReloadCoordinator::new());
        coordinator.on_any_change(Arc::new(ReconnectOnChange::new(
            Arc::clone(&store),
            registries.clone(),
        )));

        Self {
            settings,
            store,
            registries,
            aggregator,
            analyzer,
            broadcaster,
            coordinator,
        }
    }

    /// Connect every family concurrently with the store's current documents.
    ///
    /// Families fail independently; the outcome of each is returned in
    /// [`Family::ALL`] order.
    pub async fn connect_all(&self) -> Vec<(Family, Result<(), ConnectionError>)> {
        let redis = self.store.redis();
        let kafka = self.store.kafka();
        let postgres = self.store.postgres();
        let mysql = self.store.mysql();

        let (r, k, p, m) = tokio::join!(
            self.registries.key_value.connect(&redis),
            self.registries.broker.connect(&kafka),
            self.registries.postgres.connect(&postgres.databases),
            self.registries.mysql.connect(&mysql.databases),
        );
        let outcomes = vec![
            (Family::Redis, r),
            (Family::Kafka, k),
            (Family::PostgreSql, p),
            (Family::MySql, m),
        ];
        for (family, outcome) in &outcomes {
            match outcome {
                Ok(()) => info!(family = %family, "Family ready"),
                Err(e) => warn!(family = %family, error = %e, "Family unavailable"),
            }
        }
        outcomes
    }

    /// Start polling the config directory for changes.
    #[must_use]
    pub fn watch_config(&self) -> JoinHandle<()> {
        ConfigWatcher::new(
            Arc::clone(&self.store),
            Arc::clone(&self.coordinator),
            self.settings.monitoring.watch_interval(),
        )
        .spawn()
    }

    /// Stop broadcasting and release every connection.
    pub async fn shutdown(&self) {
        self.broadcaster.stop().await;
        self.registries.close_all().await;
        info!("Shutdown complete");
    }
}
