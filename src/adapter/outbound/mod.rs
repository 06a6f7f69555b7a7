//! Outbound adapters (driven side).

pub mod channel;
pub mod kafka;
pub mod redis;
pub mod sql;
pub mod websocket;
