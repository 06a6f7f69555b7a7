use std::sync::Arc;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool};
use tracing::info;

use super::{pool_options, probe, show_value};
use crate::domain::Family;
use crate::error::BackendError;
use crate::infrastructure::config::backend::DatabaseEntry;
use crate::port::{RelationalClient, RelationalConnector, RelationalStats};

const FAMILY: Family = Family::MySql;

pub struct MySqlClient {
    name: String,
    pool: MySqlPool,
}

impl MySqlClient {
    async fn status_value(&self, query: &'static str, what: &'static str) -> i64 {
        let row: (String, String) = probe(
            FAMILY,
            &self.name,
            what,
            sqlx::query_as::<_, (String, String)>(query).fetch_one(&self.pool),
        )
        .await;
        show_value(row)
    }
}

#[async_trait]
impl RelationalClient for MySqlClient {
    async fn ping(&self) -> Result<(), BackendError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| BackendError::client(FAMILY, e))?;
        Ok(())
    }

    async fn collect(&self) -> RelationalStats {
        let db = self.name.as_str();
        let pool = &self.pool;
        RelationalStats {
            version: probe(
                FAMILY,
                db,
                "version",
                sqlx::query_scalar::<_, String>("SELECT VERSION()").fetch_one(pool),
            )
            .await,
            size_bytes: probe(
                FAMILY,
                db,
                "size",
                sqlx::query_scalar::<_, i64>(
                    "SELECT CAST(COALESCE(SUM(data_length + index_length), 0) AS SIGNED) \
                     FROM information_schema.tables WHERE table_schema = DATABASE()",
                )
                .fetch_one(pool),
            )
            .await,
            table_count: probe(
                FAMILY,
                db,
                "tables",
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = DATABASE()",
                )
                .fetch_one(pool),
            )
            .await,
            uptime_seconds: self
                .status_value("SHOW GLOBAL STATUS LIKE 'Uptime'", "uptime")
                .await,
            connections: self
                .status_value("SHOW GLOBAL STATUS LIKE 'Threads_connected'", "threads_connected")
                .await,
            threads_running: self
                .status_value("SHOW GLOBAL STATUS LIKE 'Threads_running'", "threads_running")
                .await,
            max_connections: self
                .status_value("SHOW VARIABLES LIKE 'max_connections'", "max_connections")
                .await,
        }
    }

    async fn close(&self) {
        self.pool.close().await;
        info!(family = %FAMILY, database = %self.name, "Pool closed");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlConnector;

fn connect_options(entry: &DatabaseEntry) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&entry.host)
        .port(entry.port)
        .username(&entry.username)
        .password(&entry.password)
        .database(&entry.database);
    match &entry.charset {
        Some(charset) => options.charset(charset),
        None => options,
    }
}

#[async_trait]
impl RelationalConnector for MySqlConnector {
    async fn connect(
        &self,
        entry: &DatabaseEntry,
    ) -> Result<Arc<dyn RelationalClient>, BackendError> {
        let pool = pool_options(&entry.pool)
            .connect_with(connect_options(entry))
            .await
            .map_err(|e| BackendError::client(FAMILY, e))?;
        Ok(Arc::new(MySqlClient {
            name: entry.name.clone(),
            pool,
        }))
    }
}
