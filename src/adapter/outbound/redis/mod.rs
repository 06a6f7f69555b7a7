//! Key-value adapter over the `redis` crate.

mod client;

pub use client::{connection_url, RedisClient, RedisConnector};
