//! Infrastructure layer.
//!
//! Configuration loading, the config directory watcher, and the composition
//! root that wires adapters into the application services.

pub mod bootstrap;
pub mod config;
pub mod watcher;
