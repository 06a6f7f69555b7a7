//! Per-family backend configuration documents.
//!
//! Each family lives in its own file with a top-level table named after the
//! family (`[redis]`, `[kafka]`, `[postgresql]`, `[mysql]`). A document is
//! validated before it is handed to a connection registry.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::Family;
use crate::error::ConfigError;

/// Behavior shared by the four family documents.
pub trait FamilyConfig: DeserializeOwned + Serialize + Default + Clone + Send + Sync {
    const FAMILY: Family;

    /// Structural validation.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Number of instances this document configures.
    fn instance_count(&self) -> usize;

    /// Parse a document, validating it when it declares the family table.
    ///
    /// A document without the family table (including an empty one) yields
    /// the empty configuration.
    ///
    /// # Errors
    ///
    /// Returns a parse error for malformed TOML or a validation error.
    fn parse_document(content: &str) -> Result<Self, ConfigError> {
        let mut table: toml::Table = toml::from_str(content).map_err(ConfigError::Parse)?;
        let Some(value) = table.remove(Self::FAMILY.as_str()) else {
            return Ok(Self::default());
        };
        let config: Self = value.try_into().map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }
}

fn check_host(field: &'static str, host: &str) -> Result<(), ConfigError> {
    if host.trim().is_empty() {
        return Err(ConfigError::MissingField { field });
    }
    Ok(())
}

fn check_port(field: &'static str, port: u16) -> Result<(), ConfigError> {
    if port == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be greater than 0".to_string(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Key-value store
// ---------------------------------------------------------------------------

/// Single-node endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisSingle {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: i64,
}

/// One cluster node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisNode {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub password: String,
}

impl RedisNode {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Seconds; informational, the broadcast interval drives polling.
    pub interval: u64,
    pub metrics: Vec<String>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: 30,
            metrics: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub single: Option<RedisSingle>,
    pub nodes: Vec<RedisNode>,
    pub monitoring: PollSettings,
}

impl FamilyConfig for RedisConfig {
    const FAMILY: Family = Family::Redis;

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(single) = &self.single {
            check_host("redis.single.host", &single.host)?;
            check_port("redis.single.port", single.port)?;
            if single.database < 0 {
                return Err(ConfigError::InvalidValue {
                    field: "redis.single.database",
                    reason: "must be 0 or greater".to_string(),
                });
            }
        }
        let mut seen = HashSet::new();
        for node in &self.nodes {
            check_host("redis.nodes.host", &node.host)?;
            check_port("redis.nodes.port", node.port)?;
            if !seen.insert(node.address()) {
                return Err(ConfigError::InvalidValue {
                    field: "redis.nodes",
                    reason: format!("duplicate node {}", node.address()),
                });
            }
        }
        Ok(())
    }

    fn instance_count(&self) -> usize {
        usize::from(self.single.is_some()) + self.nodes.len()
    }
}

// ---------------------------------------------------------------------------
// Log broker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityProtocol {
    #[default]
    Plaintext,
    Ssl,
    SaslPlaintext,
    SaslSsl,
}

impl SecurityProtocol {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SecurityProtocol::Plaintext => "PLAINTEXT",
            SecurityProtocol::Ssl => "SSL",
            SecurityProtocol::SaslPlaintext => "SASL_PLAINTEXT",
            SecurityProtocol::SaslSsl => "SASL_SSL",
        }
    }

    #[must_use]
    pub const fn uses_sasl(self) -> bool {
        matches!(self, SecurityProtocol::SaslPlaintext | SecurityProtocol::SaslSsl)
    }

    #[must_use]
    pub const fn uses_tls(self) -> bool {
        matches!(self, SecurityProtocol::Ssl | SecurityProtocol::SaslSsl)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaSecurity {
    pub protocol: SecurityProtocol,
    pub sasl_mechanism: String,
    pub username: String,
    pub password: String,
}

impl Default for KafkaSecurity {
    fn default() -> Self {
        Self {
            protocol: SecurityProtocol::Plaintext,
            sasl_mechanism: "PLAIN".into(),
            username: String::new(),
            password: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaMonitoring {
    pub interval: u64,
    /// Empty means every non-internal topic.
    pub topics: Vec<String>,
    /// Empty means every group.
    pub consumer_groups: Vec<String>,
    pub metrics: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    /// Instance name reported in status and metric records.
    pub name: String,
    pub brokers: Vec<String>,
    pub security: KafkaSecurity,
    pub monitoring: KafkaMonitoring,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            brokers: Vec::new(),
            security: KafkaSecurity::default(),
            monitoring: KafkaMonitoring::default(),
        }
    }
}

impl FamilyConfig for KafkaConfig {
    const FAMILY: Family = Family::Kafka;

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "kafka.name" });
        }
        if self.brokers.is_empty() {
            return Err(ConfigError::MissingField {
                field: "kafka.brokers",
            });
        }
        for broker in &self.brokers {
            let Some((host, port)) = broker.rsplit_once(':') else {
                return Err(ConfigError::InvalidValue {
                    field: "kafka.brokers",
                    reason: format!("'{broker}' is not host:port"),
                });
            };
            check_host("kafka.brokers", host)?;
            let port = port.parse::<u16>().map_err(|_| ConfigError::InvalidValue {
                field: "kafka.brokers",
                reason: format!("'{broker}' has an invalid port"),
            })?;
            check_port("kafka.brokers", port)?;
        }
        if self.security.protocol.uses_sasl() && self.security.username.is_empty() {
            return Err(ConfigError::MissingField {
                field: "kafka.security.username",
            });
        }
        Ok(())
    }

    fn instance_count(&self) -> usize {
        usize::from(!self.brokers.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Relational engines
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub min_connections: u32,
    pub max_connections: u32,
    /// Seconds.
    pub max_idle_time: u64,
    /// Seconds.
    pub connection_timeout: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 5,
            max_connections: 20,
            max_idle_time: 300,
            connection_timeout: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseMonitoring {
    pub enabled: bool,
    pub interval: u64,
    pub track_activity: bool,
    pub log_slow_queries: bool,
    /// Milliseconds.
    pub slow_query_threshold: u64,
}

impl Default for DatabaseMonitoring {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 30,
            track_activity: true,
            log_slow_queries: true,
            slow_query_threshold: 1000,
        }
    }
}

/// One relational database instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEntry {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// PostgreSQL only: disable, allow, prefer, require, verify-ca, verify-full.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_mode: Option<String>,
    /// MySQL only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub monitoring: DatabaseMonitoring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheck {
    pub enabled: bool,
    pub interval: u64,
    pub timeout: u64,
}

impl Default for HealthCheck {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: 10,
            timeout: 5,
        }
    }
}

/// Alert thresholds. Carried for observers; not evaluated here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub max_connections_percent: u32,
    pub slow_query_threshold: u64,
    pub replication_lag_seconds: u64,
    pub cache_hit_ratio_min: u32,
    pub disk_usage_percent: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationalMonitoring {
    pub metrics: Vec<String>,
    pub health_check: HealthCheck,
    pub alerts: AlertThresholds,
}

const SSL_MODES: [&str; 6] = ["disable", "allow", "prefer", "require", "verify-ca", "verify-full"];

fn validate_databases(
    databases: &[DatabaseEntry],
    family: Family,
) -> Result<(), ConfigError> {
    let (name_field, host_field, port_field, pool_field, db_field) = match family {
        Family::MySql => (
            "mysql.databases.name",
            "mysql.databases.host",
            "mysql.databases.port",
            "mysql.databases.pool",
            "mysql.databases.database",
        ),
        _ => (
            "postgresql.databases.name",
            "postgresql.databases.host",
            "postgresql.databases.port",
            "postgresql.databases.pool",
            "postgresql.databases.database",
        ),
    };

    let mut names = HashSet::new();
    for entry in databases {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::MissingField { field: name_field });
        }
        if !names.insert(entry.name.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: name_field,
                reason: format!("duplicate database name '{}'", entry.name),
            });
        }
        check_host(host_field, &entry.host)?;
        check_port(port_field, entry.port)?;
        if entry.database.trim().is_empty() {
            return Err(ConfigError::MissingField { field: db_field });
        }
        if entry.pool.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: pool_field,
                reason: "max_connections must be greater than 0".to_string(),
            });
        }
        if entry.pool.min_connections > entry.pool.max_connections {
            return Err(ConfigError::InvalidValue {
                field: pool_field,
                reason: "min_connections must be <= max_connections".to_string(),
            });
        }
        if let Some(mode) = &entry.ssl_mode {
            if !SSL_MODES.contains(&mode.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "postgresql.databases.ssl_mode",
                    reason: format!("unknown ssl mode '{mode}'"),
                });
            }
        }
    }
    Ok(())
}

/// `[postgresql]` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub databases: Vec<DatabaseEntry>,
    pub monitoring: RelationalMonitoring,
}

impl FamilyConfig for PostgresConfig {
    const FAMILY: Family = Family::PostgreSql;

    fn validate(&self) -> Result<(), ConfigError> {
        validate_databases(&self.databases, Self::FAMILY)
    }

    fn instance_count(&self) -> usize {
        self.databases.len()
    }
}

/// `[mysql]` document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MySqlConfig {
    pub databases: Vec<DatabaseEntry>,
    pub monitoring: RelationalMonitoring,
}

impl FamilyConfig for MySqlConfig {
    const FAMILY: Family = Family::MySql;

    fn validate(&self) -> Result<(), ConfigError> {
        validate_databases(&self.databases, Self::FAMILY)
    }

    fn instance_count(&self) -> usize {
        self.databases.len()
    }
}
