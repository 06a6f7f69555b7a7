//! Default family documents written when a file is missing.

use crate::domain::Family;

const REDIS: &str = r#"# Redis configuration
[redis.single]
host = "localhost"
port = 6379
password = ""
database = 0

# Cluster nodes; add one [[redis.nodes]] table per node.
# [[redis.nodes]]
# host = "127.0.0.1"
# port = 7000
# password = ""

[redis.monitoring]
interval = 30
metrics = ["memory_usage", "cpu_usage", "connected_clients", "commands_per_sec"]
"#;

const KAFKA: &str = r#"# Kafka configuration
[kafka]
name = "default"
brokers = ["localhost:9092"]

[kafka.security]
protocol = "PLAINTEXT"
sasl_mechanism = "PLAIN"
username = ""
password = ""

[kafka.monitoring]
interval = 30
topics = []
consumer_groups = []
metrics = ["broker_status", "topic_partitions", "consumer_lag"]
"#;

const POSTGRESQL: &str = r#"# PostgreSQL configuration
[[postgresql.databases]]
name = "default"
host = "localhost"
port = 5432
database = "postgres"
username = "postgres"
password = "postgres"
ssl_mode = "disable"

[postgresql.databases.pool]
min_connections = 5
max_connections = 20
max_idle_time = 300
connection_timeout = 10

[postgresql.databases.monitoring]
enabled = true
interval = 30
track_activity = true
log_slow_queries = true
slow_query_threshold = 1000

[postgresql.monitoring]
metrics = ["connection_count", "active_queries", "database_size", "cache_hit_ratio"]

[postgresql.monitoring.health_check]
enabled = true
interval = 10
timeout = 5

[postgresql.monitoring.alerts]
max_connections_percent = 80
slow_query_threshold = 1000
cache_hit_ratio_min = 90
"#;

const MYSQL: &str = r#"# MySQL configuration
[[mysql.databases]]
name = "default"
host = "localhost"
port = 3306
database = "mysql"
username = "root"
password = "root"
charset = "utf8mb4"

[mysql.databases.pool]
min_connections = 5
max_connections = 20
max_idle_time = 300
connection_timeout = 10

[mysql.databases.monitoring]
enabled = true
interval = 30
track_activity = true
log_slow_queries = true
slow_query_threshold = 1000

[mysql.monitoring]
metrics = ["connection_count", "slow_queries", "innodb_buffer_pool", "threads_running"]

[mysql.monitoring.health_check]
enabled = true
interval = 10
timeout = 5

[mysql.monitoring.alerts]
max_connections_percent = 80
slow_query_threshold = 1000
"#;

/// Built-in default document for `family`.
#[must_use]
pub const fn default_document(family: Family) -> &'static str {
    match family {
        Family::Redis => REDIS,
        Family::Kafka => KAFKA,
        Family::PostgreSql => POSTGRESQL,
        Family::MySql => MYSQL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::backend::{
        FamilyConfig, KafkaConfig, MySqlConfig, PostgresConfig, RedisConfig,
    };

    #[test]
    fn every_template_parses_and_validates() {
        let redis = RedisConfig::parse_document(default_document(Family::Redis)).unwrap();
        assert_eq!(redis.instance_count(), 1);
        let kafka = KafkaConfig::parse_document(default_document(Family::Kafka)).unwrap();
        assert_eq!(kafka.brokers, vec!["localhost:9092".to_string()]);
        let pg = PostgresConfig::parse_document(default_document(Family::PostgreSql)).unwrap();
        assert_eq!(pg.databases[0].pool.max_connections, 20);
        assert_eq!(pg.monitoring.alerts.cache_hit_ratio_min, 90);
        let my = MySqlConfig::parse_document(default_document(Family::MySql)).unwrap();
        assert_eq!(my.databases[0].charset.as_deref(), Some("utf8mb4"));
    }
}
