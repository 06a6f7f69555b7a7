//! Configuration hot-reload coordination.
//!
//! A [`ConfigChange`] names the family whose file changed. Handlers register
//! per family; each notified handler runs on its own task so a slow or
//! failing family never holds up another.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::registry::Registries;
use crate::domain::Family;
use crate::error::{Error, Result};
use crate::infrastructure::config::ConfigStore;

/// A family's configuration changed on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigChange {
    pub family: Family,
}

#[async_trait]
pub trait ReloadHandler: Send + Sync {
    /// Apply the change. An error leaves the previous configuration active.
    async fn handle(&self, change: ConfigChange) -> Result<()>;

    fn name(&self) -> &'static str {
        "reload-handler"
    }
}

#[derive(Default)]
pub struct ReloadCoordinator {
    handlers: RwLock<HashMap<Family, Vec<Arc<dyn ReloadHandler>>>>,
}

impl ReloadCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for changes to `family`.
    pub fn on_change(&self, family: Family, handler: Arc<dyn ReloadHandler>) {
        self.handlers.write().entry(family).or_default().push(handler);
    }

    /// Register `handler` for every family.
    pub fn on_any_change(&self, handler: Arc<dyn ReloadHandler>) {
        let mut handlers = self.handlers.write();
        for family in Family::ALL {
            handlers.entry(family).or_default().push(Arc::clone(&handler));
        }
    }

    #[must_use]
    pub fn handler_count(&self, family: Family) -> usize {
        self.handlers.read().get(&family).map_or(0, Vec::len)
    }

    /// Dispatch `change` to its family's handlers, one task each.
    ///
    /// Returns the spawned tasks; callers may drop them.
    pub fn notify_changed(&self, change: ConfigChange) -> Vec<JoinHandle<()>> {
        let handlers = self
            .handlers
            .read()
            .get(&change.family)
            .cloned()
            .unwrap_or_default();
        if handlers.is_empty() {
            warn!(family = %change.family, "Config changed but no handler registered");
        }

        handlers
            .into_iter()
            .map(|handler| {
                tokio::spawn(async move {
                    match handler.handle(change).await {
                        Ok(()) => info!(
                            family = %change.family,
                            handler = handler.name(),
                            "Config change applied"
                        ),
                        Err(e) => error!(
                            family = %change.family,
                            handler = handler.name(),
                            error = %e,
                            "Config change rejected"
                        ),
                    }
                })
            })
            .collect()
    }
}

/// Re-read the family's file and rebuild its registry.
///
/// A document that fails to parse or validate is rejected before any
/// connection is touched.
pub struct ReconnectOnChange {
    store: Arc<ConfigStore>,
    registries: Registries,
}

impl ReconnectOnChange {
    #[must_use]
    pub fn new(store: Arc<ConfigStore>, registries: Registries) -> Self {
        Self { store, registries }
    }
}

#[async_trait]
impl ReloadHandler for ReconnectOnChange {
    async fn handle(&self, change: ConfigChange) -> Result<()> {
        self.store.reload(change.family)?;

        let outcome = match change.family {
            Family::Redis => self.registries.key_value.reconnect(&self.store.redis()).await,
            Family::Kafka => self.registries.broker.reconnect(&self.store.kafka()).await,
            Family::PostgreSql => {
                self.registries
                    .postgres
                    .reconnect(&self.store.postgres().databases)
                    .await
            }
            Family::MySql => {
                self.registries
                    .mysql
                    .reconnect(&self.store.mysql().databases)
                    .await
            }
        };
        outcome.map_err(Error::from)
    }

    fn name(&self) -> &'static str {
        "reconnect"
    }
}
