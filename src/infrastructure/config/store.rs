//! Active per-family configuration, backed by the config directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info};

use super::backend::{FamilyConfig, KafkaConfig, MySqlConfig, PostgresConfig, RedisConfig};
use super::templates::default_document;
use crate::domain::Family;
use crate::error::ConfigError;

/// Holds the last successfully validated document of every family.
///
/// A reload that fails to read, parse or validate leaves the previous
/// document in place.
pub struct ConfigStore {
    dir: PathBuf,
    redis: RwLock<RedisConfig>,
    kafka: RwLock<KafkaConfig>,
    postgres: RwLock<PostgresConfig>,
    mysql: RwLock<MySqlConfig>,
}

impl ConfigStore {
    /// Store over `dir` with every family empty. Nothing is read yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            redis: RwLock::new(RedisConfig::default()),
            kafka: RwLock::new(KafkaConfig::default()),
            postgres: RwLock::new(PostgresConfig::default()),
            mysql: RwLock::new(MySqlConfig::default()),
        }
    }

    /// Create a store and load every family document.
    ///
    /// # Errors
    ///
    /// Returns the first family document that fails to load.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let store = Self::new(dir);
        store.load_all()?;
        Ok(store)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path(&self, family: Family) -> PathBuf {
        self.dir.join(family.config_file())
    }

    /// Write the built-in template of every family whose file is missing, or
    /// of every family when `force` is set. Returns the families written.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or a file cannot be written.
    pub fn ensure_defaults(&self, force: bool) -> Result<Vec<Family>, ConfigError> {
        fs::create_dir_all(&self.dir).map_err(ConfigError::WriteFile)?;
        let mut written = Vec::new();
        for family in Family::ALL {
            let path = self.path(family);
            if path.exists() && !force {
                continue;
            }
            fs::write(&path, default_document(family)).map_err(ConfigError::WriteFile)?;
            info!(family = %family, path = %path.display(), "Wrote default config");
            written.push(family);
        }
        Ok(written)
    }

    fn read<F: FamilyConfig>(&self) -> Result<F, ConfigError> {
        let path = self.path(F::FAMILY);
        match fs::read_to_string(&path) {
            Ok(content) => F::parse_document(&content),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(family = %F::FAMILY, "No config file, using empty config");
                Ok(F::default())
            }
            Err(e) => Err(ConfigError::ReadFile(e)),
        }
    }

    /// Re-read, validate and install one family's document.
    ///
    /// # Errors
    ///
    /// Returns the read, parse or validation error; the previous document
    /// stays active.
    pub fn reload(&self, family: Family) -> Result<(), ConfigError> {
        match family {
            Family::Redis => *self.redis.write() = self.read()?,
            Family::Kafka => *self.kafka.write() = self.read()?,
            Family::PostgreSql => *self.postgres.write() = self.read()?,
            Family::MySql => *self.mysql.write() = self.read()?,
        }
        Ok(())
    }

    /// Reload every family, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first failing family's error.
    pub fn load_all(&self) -> Result<(), ConfigError> {
        for family in Family::ALL {
            self.reload(family)?;
        }
        Ok(())
    }

    /// Validate one family's file without installing it. Returns the number
    /// of configured instances.
    ///
    /// # Errors
    ///
    /// Returns the read, parse or validation error.
    pub fn check(&self, family: Family) -> Result<usize, ConfigError> {
        Ok(match family {
            Family::Redis => self.read::<RedisConfig>()?.instance_count(),
            Family::Kafka => self.read::<KafkaConfig>()?.instance_count(),
            Family::PostgreSql => self.read::<PostgresConfig>()?.instance_count(),
            Family::MySql => self.read::<MySqlConfig>()?.instance_count(),
        })
    }

    #[must_use]
    pub fn redis(&self) -> RedisConfig {
        self.redis.read().clone()
    }

    #[must_use]
    pub fn kafka(&self) -> KafkaConfig {
        self.kafka.read().clone()
    }

    #[must_use]
    pub fn postgres(&self) -> PostgresConfig {
        self.postgres.read().clone()
    }

    #[must_use]
    pub fn mysql(&self) -> MySqlConfig {
        self.mysql.read().clone()
    }
}
