//! Stackwatch - live health and performance aggregation for Redis, Kafka,
//! PostgreSQL and MySQL fleets.
//!
//! The crate keeps long-lived connections to every configured instance,
//! polls them concurrently with a hard per-request deadline, and folds the
//! results into one [`MetricsSnapshot`](domain::MetricsSnapshot). Snapshots
//! are pushed to realtime subscribers on a fixed interval. Per-family config
//! files are watched and hot-reloaded without a restart.
//!
//! # Modules
//!
//! - [`domain`] - Backend-agnostic records, statuses and cluster topology
//! - [`protocol`] - Pure parsers for INFO text, CLUSTER NODES and broker metadata
//! - [`port`] - Client, connector and sink traits
//! - [`application`] - Registries, aggregator, analyzer, broadcaster, reload
//! - [`adapter`] - Redis, Kafka, SQL and WebSocket adapters plus the CLI
//! - [`infrastructure`] - Settings, per-family config store, watcher, bootstrap
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `testkit` - In-memory fakes for every backend port

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;
pub mod protocol;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
