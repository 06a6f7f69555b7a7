//! Connection handles and the per-family handle map.
//!
//! Readers (status queries, metric polls) take the map's read lock only long
//! enough to clone what they need; nothing awaits while holding it. Writers
//! are the owning registry's connect/reconnect/close operations.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::domain::{ConnectionState, Family, InstanceStatus};
use crate::error::{BackendError, ConnectionError};

/// One live connection or pool plus its lifecycle state.
pub struct ConnectionHandle<C: ?Sized, M> {
    meta: M,
    state: ConnectionState,
    client: Option<Arc<C>>,
    last_error: Option<String>,
}

/// Instance to (re)build: unique name plus whatever the connector needs.
pub struct Instance<M> {
    pub name: String,
    pub meta: M,
}

/// Result of one connect pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectOutcome {
    pub attempted: usize,
    pub failed: usize,
}

impl ConnectOutcome {
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            attempted: self.attempted + other.attempted,
            failed: self.failed + other.failed,
        }
    }

    /// `Ok` unless instances were configured and none connected.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NoInstanceReachable`].
    pub fn into_result(self, family: Family) -> Result<(), ConnectionError> {
        if self.attempted > 0 && self.failed == self.attempted {
            return Err(ConnectionError::NoInstanceReachable {
                family,
                failed: self.failed,
            });
        }
        Ok(())
    }
}

/// Handles of one family (or one addressing mode), keyed by instance name.
pub struct HandleSet<C: ?Sized, M> {
    family: Family,
    handles: RwLock<BTreeMap<String, ConnectionHandle<C, M>>>,
}

impl<C: ?Sized, M: Clone> HandleSet<C, M> {
    #[must_use]
    pub fn new(family: Family) -> Self {
        Self {
            family,
            handles: RwLock::new(BTreeMap::new()),
        }
    }

    /// Remove every handle, returning the live clients for release.
    pub fn drain(&self) -> Vec<Arc<C>> {
        let mut handles = self.handles.write();
        std::mem::take(&mut *handles)
            .into_values()
            .filter_map(|h| h.client)
            .collect()
    }

    /// Mark every handle `Disconnected`, returning the live clients for release.
    pub fn disconnect_all(&self) -> Vec<Arc<C>> {
        let mut handles = self.handles.write();
        handles
            .values_mut()
            .filter_map(|h| {
                h.state = ConnectionState::Disconnected;
                h.client.take()
            })
            .collect()
    }

    /// Connect every instance concurrently, each bounded by `timeout`.
    ///
    /// Existing handles must already be drained. `connect` is expected to
    /// include the liveness probe; an instance is `Connected` only when it
    /// returns a client.
    pub async fn connect_all<F, Fut>(
        &self,
        instances: Vec<Instance<M>>,
        timeout: Duration,
        connect: F,
    ) -> ConnectOutcome
    where
        F: Fn(M) -> Fut,
        Fut: Future<Output = Result<Arc<C>, BackendError>>,
    {
        {
            let mut handles = self.handles.write();
            for instance in &instances {
                handles.insert(
                    instance.name.clone(),
                    ConnectionHandle {
                        meta: instance.meta.clone(),
                        state: ConnectionState::Connecting,
                        client: None,
                        last_error: None,
                    },
                );
            }
        }

        let attempts = instances.into_iter().map(|Instance { name, meta }| {
            let pending = connect(meta);
            async move {
                let result = match tokio::time::timeout(timeout, pending).await {
                    Ok(Ok(client)) => Ok(client),
                    Ok(Err(e)) => Err(ConnectionError::Unreachable {
                        family: self.family,
                        instance: name.clone(),
                        reason: e.to_string(),
                    }),
                    Err(_) => Err(ConnectionError::Timeout {
                        family: self.family,
                        instance: name.clone(),
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                };
                (name, result)
            }
        });
        let results = join_all(attempts).await;

        let mut outcome = ConnectOutcome {
            attempted: results.len(),
            failed: 0,
        };
        let mut handles = self.handles.write();
        for (name, result) in results {
            let Some(handle) = handles.get_mut(&name) else {
                continue;
            };
            match result {
                Ok(client) => {
                    info!(family = %self.family, instance = %name, "Connected");
                    handle.state = ConnectionState::Connected;
                    handle.client = Some(client);
                    handle.last_error = None;
                }
                Err(e) => {
                    warn!(family = %self.family, instance = %name, error = %e, "Connect failed");
                    outcome.failed += 1;
                    handle.state = ConnectionState::Failed;
                    handle.last_error = Some(e.to_string());
                }
            }
        }
        outcome
    }

    /// Connected clients with their instance data, in name order.
    #[must_use]
    pub fn connected(&self) -> Vec<(String, M, Arc<C>)> {
        self.handles
            .read()
            .iter()
            .filter_map(|(name, h)| {
                h.client
                    .as_ref()
                    .filter(|_| h.state.is_connected())
                    .map(|c| (name.clone(), h.meta.clone(), Arc::clone(c)))
            })
            .collect()
    }

    #[must_use]
    pub fn statuses(&self) -> Vec<InstanceStatus> {
        self.handles
            .read()
            .iter()
            .map(|(name, h)| InstanceStatus::new(name.clone(), h.state, h.last_error.clone()))
            .collect()
    }

    #[must_use]
    pub fn state(&self, name: &str) -> Option<ConnectionState> {
        self.handles.read().get(name).map(|h| h.state)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }

    #[must_use]
    pub fn any_connected(&self) -> bool {
        self.handles.read().values().any(|h| h.state.is_connected())
    }
}
