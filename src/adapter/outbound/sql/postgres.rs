use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgSslMode};
use tracing::info;

use super::{pool_options, probe};
use crate::domain::Family;
use crate::error::BackendError;
use crate::infrastructure::config::backend::DatabaseEntry;
use crate::port::{RelationalClient, RelationalConnector, RelationalStats};

const FAMILY: Family = Family::PostgreSql;

pub struct PostgresClient {
    name: String,
    pool: PgPool,
}

#[async_trait]
impl RelationalClient for PostgresClient {
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
                sqlx::query_scalar::<_, String>("SELECT version()").fetch_one(pool),
            )
            .await,
            size_bytes: probe(
                FAMILY,
                db,
                "size",
                sqlx::query_scalar::<_, i64>("SELECT pg_database_size(current_database())")
                    .fetch_one(pool),
            )
            .await,
            table_count: probe(
                FAMILY,
                db,
                "tables",
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public'",
                )
                .fetch_one(pool),
            )
            .await,
            uptime_seconds: probe(
                FAMILY,
                db,
                "uptime",
                sqlx::query_scalar::<_, i64>(
                    "SELECT EXTRACT(EPOCH FROM (NOW() - pg_postmaster_start_time()))::BIGINT",
                )
                .fetch_one(pool),
            )
            .await,
            connections: probe(
                FAMILY,
                db,
                "connections",
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM pg_stat_activity WHERE datname = current_database()",
                )
                .fetch_one(pool),
            )
            .await,
            threads_running: 0,
            max_connections: probe(
                FAMILY,
                db,
                "max_connections",
                sqlx::query_scalar::<_, String>("SHOW max_connections").fetch_one(pool),
            )
            .await
            .parse()
            .unwrap_or(0),
        }
    }

    async fn close(&self) {
        self.pool.close().await;
        info!(family = %FAMILY, database = %self.name, "Pool closed");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresConnector;

fn connect_options(entry: &DatabaseEntry) -> Result<PgConnectOptions, BackendError> {
    let mut options = PgConnectOptions::new()
        .host(&entry.host)
        .port(entry.port)
        .username(&entry.username)
        .password(&entry.password)
        .database(&entry.database);
    if let Some(mode) = &entry.ssl_mode {
        let mode = PgSslMode::from_str(mode).map_err(|e| BackendError::client(FAMILY, e))?;
        options = options.ssl_mode(mode);
    }
    Ok(options)
}

#[async_trait]
impl RelationalConnector for PostgresConnector {
    async fn connect(
        &self,
        entry: &DatabaseEntry,
    ) -> Result<Arc<dyn RelationalClient>, BackendError> {
        let pool = pool_options(&entry.pool)
            .connect_with(connect_options(entry)?)
            .await
            .map_err(|e| BackendError::client(FAMILY, e))?;
        Ok(Arc::new(PostgresClient {
            name: entry.name.clone(),
            pool,
        }))
    }
}

