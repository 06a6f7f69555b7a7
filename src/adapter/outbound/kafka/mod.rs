//! Log-broker adapter over `rdkafka`.
//!
//! librdkafka calls block, so every call runs on the blocking pool with the
//! connector's timeout passed down to the client.

mod admin;

pub use admin::{client_config, KafkaAdmin, KafkaConnector};
