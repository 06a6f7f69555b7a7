//! Application services.
//!
//! Registries own backend connections; the aggregator, the topology analyzer
//! and the broadcaster read through them. The reload coordinator routes
//! configuration changes back into the registries.

pub mod aggregator;
pub mod analyzer;
pub mod broadcaster;
pub mod deadline;
pub mod registry;
pub mod reload;

pub use aggregator::MetricsAggregator;
pub use analyzer::ClusterTopologyAnalyzer;
pub use broadcaster::{RealtimeBroadcaster, SubscriberId, TickReport};
pub use deadline::with_deadline;
pub use registry::Registries;
pub use reload::{ConfigChange, ReconnectOnChange, ReloadCoordinator, ReloadHandler};
