use thiserror::Error;

use crate::domain::Family;

/// Configuration-related errors with structured variants.
///
/// Any of these rejects a proposed configuration document before it reaches
/// a connection registry; the previously active configuration stays in effect.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to write config file: {0}")]
    WriteFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Failure of a single backend call (status query, metadata fetch, SQL probe).
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    #[error("{family} request timed out after {timeout_ms}ms")]
    Timeout { family: Family, timeout_ms: u64 },

    #[error("{family} client error: {message}")]
    Client { family: Family, message: String },

    #[error("{family} returned an unexpected reply: {message}")]
    Protocol { family: Family, message: String },
}

impl BackendError {
    pub fn client(family: Family, err: impl std::fmt::Display) -> Self {
        Self::Client {
            family,
            message: err.to_string(),
        }
    }
}

/// Initial connect or liveness probe failures.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    #[error("{family} instance '{instance}' unreachable: {reason}")]
    Unreachable {
        family: Family,
        instance: String,
        reason: String,
    },

    #[error("{family} instance '{instance}' did not answer within {timeout_ms}ms")]
    Timeout {
        family: Family,
        instance: String,
        timeout_ms: u64,
    },

    #[error("no {family} instance reachable ({failed} failed)")]
    NoInstanceReachable { family: Family, failed: usize },
}

/// Errors raised while parsing backend-native text.
///
/// Field-level problems never surface here; they leave the field at zero.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no cluster nodes parsed")]
    NoClusterNodes,
}

/// Failures of the on-demand cluster overview query.
#[derive(Error, Debug)]
pub enum ClusterQueryError {
    #[error("no cluster addresses configured")]
    NoAddresses,

    #[error("unable to fetch CLUSTER NODES from any of {attempts} address(es): {last}")]
    NoReachableAddress { attempts: usize, last: BackendError },

    #[error("parse cluster nodes failed: {0}")]
    Parse(#[from] ParseError),
}

/// Delivery failure towards one realtime subscriber.
#[derive(Error, Debug)]
pub enum BroadcastError {
    #[error("subscriber channel closed")]
    Closed,

    #[error("delivery timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Cluster(#[from] ClusterQueryError),

    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<tokio_tungstenite::tungstenite::Error> for BroadcastError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        BroadcastError::Transport(err.to_string())
    }
}
