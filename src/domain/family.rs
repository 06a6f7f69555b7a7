//! Backend families and key-value addressing modes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One class of monitored backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// In-memory key-value store (single node and/or cluster).
    Redis,
    /// Distributed log broker.
    Kafka,
    /// PostgreSQL relational engine.
    #[serde(rename = "postgresql")]
    PostgreSql,
    /// MySQL relational engine.
    #[serde(rename = "mysql")]
    MySql,
}

impl Family {
    /// All families in a stable order.
    pub const ALL: [Family; 4] = [Family::Redis, Family::Kafka, Family::PostgreSql, Family::MySql];

    /// Lowercase identifier used in logs, file names and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Family::Redis => "redis",
            Family::Kafka => "kafka",
            Family::PostgreSql => "postgresql",
            Family::MySql => "mysql",
        }
    }

    /// Name of the family's configuration document inside the config directory.
    #[must_use]
    pub const fn config_file(self) -> &'static str {
        match self {
            Family::Redis => "redis.toml",
            Family::Kafka => "kafka.toml",
            Family::PostgreSql => "postgresql.toml",
            Family::MySql => "mysql.toml",
        }
    }

    /// Resolve a configuration file name back to its family.
    #[must_use]
    pub fn from_config_file(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.config_file() == name)
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Addressing mode of the key-value family.
///
/// The registry may hold both a single-node handle and a set of cluster-node
/// handles at the same time; reads select one set by this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyValueMode {
    Single,
    Cluster,
}

impl KeyValueMode {
    pub const ALL: [KeyValueMode; 2] = [KeyValueMode::Single, KeyValueMode::Cluster];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            KeyValueMode::Single => "single",
            KeyValueMode::Cluster => "cluster",
        }
    }
}

impl fmt::Display for KeyValueMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
