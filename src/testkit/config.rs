//! Canonical test configurations.
//!
//! Family documents in the on-disk format, short-timeout settings and an
//! [`AppContext`] wired to the in-memory fakes.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use super::backend::{FakeBroker, FakeKeyValue, FakeRelational};
use crate::domain::Family;
use crate::error::ConfigError;
use crate::infrastructure::bootstrap::{AppContext, Connectors};
use crate::infrastructure::config::settings::{MonitoringConfig, Settings};
use crate::infrastructure::config::ConfigStore;

/// `redis.toml` with an optional single endpoint and cluster nodes, all as
/// `host:port`.
pub fn redis_document(single: Option<&str>, nodes: &[&str]) -> String {
    let mut doc = String::new();
    if let Some(address) = single {
        let (host, port) = split(address);
        let _ = write!(doc, "[redis.single]\nhost = \"{host}\"\nport = {port}\n\n");
    }
    for address in nodes {
        let (host, port) = split(address);
        let _ = write!(doc, "[[redis.nodes]]\nhost = \"{host}\"\nport = {port}\n\n");
    }
    doc
}

/// `kafka.toml` for one cluster.
pub fn kafka_document(name: &str, brokers: &[&str]) -> String {
    let brokers = brokers
        .iter()
        .map(|b| format!("\"{b}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[kafka]\nname = \"{name}\"\nbrokers = [{brokers}]\n")
}

/// `postgresql.toml` or `mysql.toml` with one entry per name, all on
/// localhost.
pub fn relational_document(family: Family, names: &[&str]) -> String {
    let (table, port) = match family {
        Family::MySql => ("mysql", 3306),
        _ => ("postgresql", 5432),
    };
    let mut doc = String::new();
    for name in names {
        let _ = write!(
            doc,
            "[[{table}.databases]]\nname = \"{name}\"\nhost = \"localhost\"\nport = {port}\n\
             database = \"{name}\"\nusername = \"monitor\"\n\n"
        );
    }
    doc
}

/// Write `content` as `family`'s file under `dir`.
///
/// # Errors
///
/// Returns the I/O error of the write.
pub fn write_document(dir: &Path, family: Family, content: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(dir.join(family.config_file()), content)
}

/// Settings over `dir` with timeouts short enough for paused-clock tests.
pub fn settings(dir: &Path) -> Settings {
    Settings {
        monitoring: MonitoringConfig {
            request_timeout_ms: 200,
            broadcast_interval_secs: 1,
            delivery_timeout_ms: 100,
            watch_interval_secs: 1,
        },
        config_dir: dir.to_path_buf(),
        ..Settings::default()
    }
}

/// One fake per backend family.
#[derive(Clone, Default)]
pub struct Fakes {
    pub key_value: FakeKeyValue,
    pub broker: FakeBroker,
    pub postgres: FakeRelational,
    pub mysql: FakeRelational,
}

impl Fakes {
    pub fn connectors(&self) -> Connectors {
        Connectors {
            key_value: Arc::new(self.key_value.clone()),
            broker: Arc::new(self.broker.clone()),
            postgres: Arc::new(self.postgres.clone()),
            mysql: Arc::new(self.mysql.clone()),
        }
    }
}

/// Load every document under `dir` and wire a context over fresh fakes.
///
/// # Errors
///
/// Returns the first family document that fails to load.
pub fn context(dir: &Path) -> Result<(AppContext, Fakes), ConfigError> {
    let fakes = Fakes::default();
    let store = Arc::new(ConfigStore::open(dir)?);
    let context = AppContext::new(settings(dir), store, fakes.connectors());
    Ok((context, fakes))
}

fn split(address: &str) -> (&str, &str) {
    address.rsplit_once(':').unwrap_or((address, "0"))
}
