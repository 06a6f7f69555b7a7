//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`backend`] - In-memory connectors for every backend port:
//!   `FakeKeyValue`, `FakeBroker`, `FakeRelational`.
//! - [`sink`] - Snapshot sinks that record or reject deliveries.
//! - [`fixtures`] - Canned status text, cluster listings and broker metadata.
//! - [`config`] - Canonical family documents, settings and a wired context.

pub mod backend;
pub mod config;
pub mod fixtures;
pub mod sink;
