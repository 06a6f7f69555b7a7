//! Connection registries, one per backend family.
//!
//! A registry exclusively owns its handles. Connect and reconnect are full
//! teardown-then-rebuild passes serialized by a lifecycle lock; readers only
//! ever see cloned client handles.

mod broker;
mod handle;
mod key_value;
mod relational;

pub use broker::{BrokerRegistry, BrokerTarget};
pub use handle::{ConnectOutcome, ConnectionHandle, HandleSet, Instance};
pub use key_value::{KeyValueRegistry, KeyValueTarget};
pub use relational::{RelationalRegistry, RelationalTarget};

use std::sync::Arc;

/// The four family registries, shared by the aggregator, the reload
/// handlers and the status surfaces.
#[derive(Clone)]
pub struct Registries {
    pub key_value: Arc<KeyValueRegistry>,
    pub broker: Arc<BrokerRegistry>,
    pub postgres: Arc<RelationalRegistry>,
    pub mysql: Arc<RelationalRegistry>,
}

impl Registries {
    /// Status of every family, in [`Family::ALL`](crate::domain::Family::ALL) order.
    #[must_use]
    pub fn statuses(&self) -> Vec<crate::domain::FamilyStatus> {
        vec![
            self.key_value.status(),
            self.broker.status(),
            self.postgres.status(),
            self.mysql.status(),
        ]
    }

    /// Release every connection of every family.
    pub async fn close_all(&self) {
        tokio::join!(
            self.key_value.close(),
            self.broker.close(),
            self.postgres.close(),
            self.mysql.close(),
        );
    }
}
