//! Relational registry, shared by the PostgreSQL and MySQL families.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::info;

use super::handle::{HandleSet, Instance};
use crate::domain::{Family, FamilyStatus};
use crate::error::{BackendError, ConnectionError};
use crate::infrastructure::config::backend::DatabaseEntry;
use crate::port::{RelationalClient, RelationalConnector};

/// Connected database as handed to readers.
pub struct RelationalTarget {
    pub entry: DatabaseEntry,
    pub client: Arc<dyn RelationalClient>,
}

/// One pool per configured database entry, keyed by entry name.
pub struct RelationalRegistry {
    family: Family,
    connector: Arc<dyn RelationalConnector>,
    timeout: Duration,
    handles: HandleSet<dyn RelationalClient, DatabaseEntry>,
    entries: RwLock<Vec<DatabaseEntry>>,
    lifecycle: Mutex<()>,
}

impl RelationalRegistry {
    pub fn new(family: Family, connector: Arc<dyn RelationalConnector>, timeout: Duration) -> Self {
        Self {
            family,
            connector,
            timeout,
            handles: HandleSet::new(family),
            entries: RwLock::new(Vec::new()),
            lifecycle: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn family(&self) -> Family {
        self.family
    }

    async fn release(clients: Vec<Arc<dyn RelationalClient>>) {
        for client in clients {
            client.close().await;
        }
    }

    async fn rebuild(&self, entries: &[DatabaseEntry]) -> Result<(), ConnectionError> {
        Self::release(self.handles.drain()).await;
        *self.entries.write() = entries.to_vec();

        let instances = entries
            .iter()
            .map(|entry| Instance {
                name: entry.name.clone(),
                meta: entry.clone(),
            })
            .collect();
        let connector = &self.connector;
        let outcome = self
            .handles
            .connect_all(instances, self.timeout, |entry| async move {
                let client = connector.connect(&entry).await?;
                if let Err(e) = client.ping().await {
                    client.close().await;
                    return Err(e);
                }
                Ok::<_, BackendError>(client)
            })
            .await;
        info!(
            family = %self.family,
            attempted = outcome.attempted,
            failed = outcome.failed,
            "Connect pass finished"
        );
        outcome.into_result(self.family)
    }

    /// Open and ping one pool per database entry.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NoInstanceReachable`] when entries are
    /// configured and none answered the ping.
    pub async fn connect(&self, entries: &[DatabaseEntry]) -> Result<(), ConnectionError> {
        let _guard = self.lifecycle.lock().await;
        self.rebuild(entries).await
    }

    /// Close every pool, then connect with `entries`.
    ///
    /// # Errors
    ///
    /// Same as [`connect`](Self::connect).
    pub async fn reconnect(&self, entries: &[DatabaseEntry]) -> Result<(), ConnectionError> {
        let _guard = self.lifecycle.lock().await;
        info!(family = %self.family, "Reconnecting");
        self.rebuild(entries).await
    }

    /// Close every pool. Idempotent.
    pub async fn close(&self) {
        let _guard = self.lifecycle.lock().await;
        Self::release(self.handles.disconnect_all()).await;
    }

    #[must_use]
    pub fn status(&self) -> FamilyStatus {
        FamilyStatus::new(self.family, self.handles.statuses())
    }

    #[must_use]
    pub fn targets(&self) -> Vec<RelationalTarget> {
        self.handles
            .connected()
            .into_iter()
            .map(|(_, entry, client)| RelationalTarget { entry, client })
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

    /// `name@host:port/database` of every configured entry.
    #[must_use]
    pub fn connection_info(&self) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .map(|e| format!("{}@{}:{}/{}", e.name, e.host, e.port, e.database))
            .collect()
    }
}
