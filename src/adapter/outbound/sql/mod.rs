//! Relational adapters over `sqlx` pools.
//!
//! Metric probes are independent: a failing probe is logged and leaves its
//! field at zero instead of failing the whole collection.

mod mysql;
mod postgres;

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::domain::Family;
use crate::infrastructure::config::backend::PoolConfig;

pub use mysql::{MySqlClient, MySqlConnector};
pub use postgres::{PostgresClient, PostgresConnector};

async fn probe<T, F>(family: Family, database: &str, what: &'static str, query: F) -> T
where
    T: Default,
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match query.await {
        Ok(value) => value,
        Err(e) => {
            warn!(family = %family, database, probe = what, error = %e, "Metric probe failed");
            T::default()
        }
    }
}

fn pool_options<DB: sqlx::Database>(pool: &PoolConfig) -> sqlx::pool::PoolOptions<DB> {
    sqlx::pool::PoolOptions::new()
        .min_connections(pool.min_connections)
        .max_connections(pool.max_connections)
        .idle_timeout(Duration::from_secs(pool.max_idle_time))
        .acquire_timeout(Duration::from_secs(pool.connection_timeout))
}

/// Value column of a `SHOW ... LIKE` row, parsed as an integer.
fn show_value((_, value): (String, String)) -> i64 {
    value.trim().parse().unwrap_or(0)
}
