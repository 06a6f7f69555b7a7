//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                 ┌──────────────────────────────┐
//!                 │         Application          │
//!                 │  registries · aggregator ·   │
//!                 │  analyzer · broadcaster      │
//!                 └──────────────┬───────────────┘
//!          ┌─────────────────────┼─────────────────────┐
//!          ▼                     ▼                     ▼
//!   ┌─────────────┐      ┌──────────────┐      ┌──────────────┐
//!   │ Key-value / │      │  Relational  │      │  Snapshot    │
//!   │   broker    │      │   adapters   │      │    sinks     │
//!   └─────────────┘      └──────────────┘      └──────────────┘
//! ```

pub mod outbound;

pub use outbound::backend::{
    BrokerAdmin, BrokerConnector, KeyValueClient, KeyValueConnector, KeyValueEndpoint,
    RelationalClient, RelationalConnector, RelationalStats,
};
pub use outbound::sink::{SnapshotSink, SnapshotSource};
