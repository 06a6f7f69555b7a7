use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use tracing::debug;
use url::Url;

use crate::domain::Family;
use crate::error::BackendError;
use crate::port::{KeyValueClient, KeyValueConnector, KeyValueEndpoint};

/// `redis://[:password@]host:port/db` for an endpoint.
///
/// # Errors
///
/// Returns an error when the host does not form a valid URL.
pub fn connection_url(endpoint: &KeyValueEndpoint) -> Result<Url, BackendError> {
    let mut url = Url::parse(&format!(
        "redis://{}:{}/{}",
        endpoint.host, endpoint.port, endpoint.database
    ))
    .map_err(|e| BackendError::client(Family::Redis, e))?;
    if !endpoint.password.is_empty() {
        url.set_password(Some(&endpoint.password))
            .map_err(|()| BackendError::client(Family::Redis, "password not accepted in URL"))?;
    }
    Ok(url)
}

/// One multiplexed connection; clones share the underlying socket.
pub struct RedisClient {
    address: String,
    conn: MultiplexedConnection,
}

impl RedisClient {
    async fn query(&self, cmd: &mut redis::Cmd) -> Result<String, BackendError> {
        let mut conn = self.conn.clone();
        let reply: String = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| BackendError::client(Family::Redis, e))?;
        Ok(reply)
    }
}

#[async_trait]
impl KeyValueClient for RedisClient {
    async fn ping(&self) -> Result<(), BackendError> {
        let pong = self.query(&mut redis::cmd("PING")).await?;
        if pong.eq_ignore_ascii_case("PONG") {
            Ok(())
        } else {
            Err(BackendError::Protocol {
                family: Family::Redis,
                message: format!("unexpected PING reply '{pong}' from {}", self.address),
            })
        }
    }

    async fn info(&self, section: Option<&str>) -> Result<String, BackendError> {
        let mut cmd = redis::cmd("INFO");
        if let Some(section) = section {
            cmd.arg(section);
        }
        self.query(&mut cmd).await
    }

    async fn cluster_nodes(&self) -> Result<String, BackendError> {
        let mut cmd = redis::cmd("CLUSTER");
        cmd.arg("NODES");
        self.query(&mut cmd).await
    }

    async fn cluster_info(&self) -> Result<String, BackendError> {
        let mut cmd = redis::cmd("CLUSTER");
        cmd.arg("INFO");
        self.query(&mut cmd).await
    }

    /// The multiplexed connection shuts down when its last clone drops;
    /// there is no explicit quit.
    async fn close(&self) {
        debug!(address = %self.address, "Dropping multiplexed connection");
    }
}

/// Opens multiplexed connections through [`redis::Client`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RedisConnector;

#[async_trait]
impl KeyValueConnector for RedisConnector {
    async fn connect(
        &self,
        endpoint: &KeyValueEndpoint,
    ) -> Result<Arc<dyn KeyValueClient>, BackendError> {
        let url = connection_url(endpoint)?;
        let client =
            redis::Client::open(url.as_str()).map_err(|e| BackendError::client(Family::Redis, e))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BackendError::client(Family::Redis, e))?;
        Ok(Arc::new(RedisClient {
            address: endpoint.address(),
            conn,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(password: &str, database: i64) -> KeyValueEndpoint {
        KeyValueEndpoint {
            host: "cache.internal".into(),
            port: 6380,
            password: password.into(),
            database,
        }
    }

    #[test]
    fn url_without_password() {
        let url = connection_url(&endpoint("", 2)).unwrap();
        assert_eq!(url.as_str(), "redis://cache.internal:6380/2");
    }

    #[test]
    fn url_escapes_password() {
        let url = connection_url(&endpoint("p@ss word", 0)).unwrap();
        assert_eq!(url.password(), Some("p%40ss%20word"));
        assert_eq!(url.host_str(), Some("cache.internal"));
        assert_eq!(url.port(), Some(6380));
    }
}
