//! Infrastructure configuration modules.

pub mod backend;
pub mod logging;
pub mod settings;
pub mod store;
mod templates;

pub use store::ConfigStore;
pub use templates::default_document;
