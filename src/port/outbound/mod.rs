//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the backend clients the registries own and the
//! delivery channels the broadcaster pushes to.

pub mod backend;
pub mod sink;
