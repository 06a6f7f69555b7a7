use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::metadata::Metadata;
use rdkafka::topic_partition_list::{Offset, TopicPartitionList};
use tracing::{debug, warn};

use crate::domain::{
    BrokerMetadata, BrokerNode, ConsumerGroupInfo, Family, PartitionMetadata, PartitionOffsets,
    TopicMetadata,
};
use crate::error::BackendError;
use crate::infrastructure::config::backend::KafkaConfig;
use crate::port::{BrokerAdmin, BrokerConnector};

const MONITOR_GROUP: &str = "stackwatch-monitor";

/// Socket, metadata, request and connection-setup timeout, in milliseconds.
const FAIL_FAST_MS: &str = "3000";
/// Fixed reconnect backoff, in milliseconds.
const RECONNECT_BACKOFF_MS: &str = "1000";
const SYSTEM_CA_BUNDLE: &str = "/etc/ssl/certs/ca-certificates.crt";

/// librdkafka client settings for `config`, joining as `group_id`.
#[must_use]
pub fn client_config(config: &KafkaConfig, group_id: &str) -> ClientConfig {
    let security = &config.security;
    let mut client = ClientConfig::new();
    client
        .set("bootstrap.servers", config.brokers.join(","))
        .set("group.id", group_id)
        .set("enable.auto.commit", "false")
        .set("socket.timeout.ms", FAIL_FAST_MS)
        .set("metadata.request.timeout.ms", FAIL_FAST_MS)
        .set("request.timeout.ms", FAIL_FAST_MS)
        .set("socket.connection.setup.timeout.ms", FAIL_FAST_MS)
        .set("connections.max.idle.ms", FAIL_FAST_MS)
        .set("reconnect.backoff.ms", RECONNECT_BACKOFF_MS)
        .set("reconnect.backoff.max.ms", RECONNECT_BACKOFF_MS)
        .set("socket.keepalive.enable", "false")
        .set("log.connection.close", "false")
        .set("security.protocol", security.protocol.as_str());
    if security.protocol.uses_tls() {
        client.set("ssl.ca.location", SYSTEM_CA_BUNDLE);
    }
    if security.protocol.uses_sasl() {
        client
            .set("sasl.mechanisms", &security.sasl_mechanism)
            .set("sasl.username", &security.username)
            .set("sasl.password", &security.password);
    }
    client
}

fn kafka_error(err: impl std::fmt::Display) -> BackendError {
    BackendError::client(Family::Kafka, err)
}

async fn blocking<T, F>(call: F) -> Result<T, BackendError>
where
    F: FnOnce() -> Result<T, BackendError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call).await.map_err(kafka_error)?
}

fn convert_metadata(metadata: &Metadata) -> BrokerMetadata {
    BrokerMetadata {
        origin_broker_id: metadata.orig_broker_id(),
        origin_broker_name: metadata.orig_broker_name().to_string(),
        brokers: metadata
            .brokers()
            .iter()
            .map(|b| BrokerNode {
                id: b.id(),
                host: b.host().to_string(),
                port: b.port(),
            })
            .collect(),
        topics: metadata
            .topics()
            .iter()
            .map(|t| TopicMetadata {
                name: t.name().to_string(),
                error: t.error().map(|e| format!("{e:?}")),
                partitions: t
                    .partitions()
                    .iter()
                    .map(|p| PartitionMetadata {
                        id: p.id(),
                        leader: p.leader(),
                        replicas: p.replicas().to_vec(),
                        isr: p.isr().to_vec(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

/// Metadata consumer for one configured cluster.
pub struct KafkaAdmin {
    config: KafkaConfig,
    consumer: Arc<BaseConsumer>,
    timeout: Duration,
}

#[async_trait]
impl BrokerAdmin for KafkaAdmin {
    async fn ping(&self) -> Result<(), BackendError> {
        let metadata = self.metadata().await?;
        if metadata.brokers.is_empty() {
            return Err(BackendError::Protocol {
                family: Family::Kafka,
                message: "metadata lists no brokers".into(),
            });
        }
        Ok(())
    }

    async fn metadata(&self) -> Result<BrokerMetadata, BackendError> {
        let consumer = Arc::clone(&self.consumer);
        let timeout = self.timeout;
        blocking(move || {
            let metadata = consumer.fetch_metadata(None, timeout).map_err(kafka_error)?;
            Ok(convert_metadata(&metadata))
        })
        .await
    }

    async fn consumer_groups(&self) -> Result<Vec<ConsumerGroupInfo>, BackendError> {
        let consumer = Arc::clone(&self.consumer);
        let timeout = self.timeout;
        blocking(move || {
            let groups = consumer.fetch_group_list(None, timeout).map_err(kafka_error)?;
            Ok(groups
                .groups()
                .iter()
                .map(|g| ConsumerGroupInfo {
                    group_id: g.name().to_string(),
                    state: g.state().to_string(),
                    members: g.members().len(),
                })
                .collect())
        })
        .await
    }

    async fn committed_offsets(
        &self,
        group: &str,
        partitions: &[(String, i32)],
    ) -> Result<Vec<PartitionOffsets>, BackendError> {
        if partitions.is_empty() {
            return Ok(Vec::new());
        }
        // Committed offsets are only visible to a member of the group.
        let consumer: BaseConsumer = client_config(&self.config, group)
            .create()
            .map_err(kafka_error)?;
        let mut assignment = TopicPartitionList::new();
        for (topic, partition) in partitions {
            assignment.add_partition(topic, *partition);
        }
        let timeout = self.timeout;
        let group = group.to_string();

        blocking(move || {
            let committed = consumer
                .committed_offsets(assignment, timeout)
                .map_err(kafka_error)?;
            let mut offsets = Vec::new();
            for element in committed.elements() {
                let Offset::Offset(position) = element.offset() else {
                    continue;
                };
                match consumer.fetch_watermarks(element.topic(), element.partition(), timeout) {
                    Ok((_, high)) => offsets.push(PartitionOffsets {
                        topic: element.topic().to_string(),
                        partition: element.partition(),
                        committed: position,
                        high_watermark: high,
                    }),
                    Err(e) => warn!(
                        group = %group,
                        topic = element.topic(),
                        partition = element.partition(),
                        error = %e,
                        "Watermark fetch failed"
                    ),
                }
            }
            Ok(offsets)
        })
        .await
    }

    /// The consumer's sockets are released when the last handle to it drops,
    /// which happens once the registry lets go of this admin.
    async fn close(&self) {
        debug!(cluster = %self.config.name, "Releasing metadata consumer");
    }
}

/// Builds [`KafkaAdmin`]s from cluster configuration.
#[derive(Debug, Default, Clone, Copy)]
pub struct KafkaConnector;

#[async_trait]
impl BrokerConnector for KafkaConnector {
    async fn connect(
        &self,
        config: &KafkaConfig,
        timeout: Duration,
    ) -> Result<Arc<dyn BrokerAdmin>, BackendError> {
        let consumer: BaseConsumer = client_config(config, MONITOR_GROUP)
            .create()
            .map_err(kafka_error)?;
        Ok(Arc::new(KafkaAdmin {
            config: config.clone(),
            consumer: Arc::new(consumer),
            timeout,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::backend::{KafkaSecurity, SecurityProtocol};

    #[test]
    fn plaintext_config_has_no_sasl_keys() {
        let config = KafkaConfig {
            brokers: vec!["k1:9092".into(), "k2:9092".into()],
            ..KafkaConfig::default()
        };
        let client = client_config(&config, "g");
        assert_eq!(client.get("bootstrap.servers"), Some("k1:9092,k2:9092"));
        assert_eq!(client.get("security.protocol"), Some("PLAINTEXT"));
        assert_eq!(client.get("sasl.username"), None);
        assert_eq!(client.get("ssl.ca.location"), None);
        for key in [
            "socket.timeout.ms",
            "metadata.request.timeout.ms",
            "request.timeout.ms",
            "socket.connection.setup.timeout.ms",
        ] {
            assert_eq!(client.get(key), Some("3000"), "{key}");
        }
        assert_eq!(client.get("reconnect.backoff.ms"), Some("1000"));
        assert_eq!(client.get("reconnect.backoff.max.ms"), Some("1000"));
    }

    #[test]
    fn sasl_config_carries_credentials() {
        let config = KafkaConfig {
            brokers: vec!["k1:9093".into()],
            security: KafkaSecurity {
                protocol: SecurityProtocol::SaslSsl,
                sasl_mechanism: "SCRAM-SHA-512".into(),
                username: "monitor".into(),
                password: "secret".into(),
            },
            ..KafkaConfig::default()
        };
        let client = client_config(&config, MONITOR_GROUP);
        assert_eq!(client.get("security.protocol"), Some("SASL_SSL"));
        assert_eq!(client.get("sasl.mechanisms"), Some("SCRAM-SHA-512"));
        assert_eq!(client.get("sasl.username"), Some("monitor"));
        assert_eq!(client.get("group.id"), Some(MONITOR_GROUP));
        assert_eq!(client.get("ssl.ca.location"), Some(SYSTEM_CA_BUNDLE));
        assert_eq!(client.get("request.timeout.ms"), Some("3000"));
    }

    #[test]
    fn sasl_plaintext_has_no_ca_bundle() {
        let config = KafkaConfig {
            brokers: vec!["k1:9092".into()],
            security: KafkaSecurity {
                protocol: SecurityProtocol::SaslPlaintext,
                sasl_mechanism: "PLAIN".into(),
                username: "monitor".into(),
                password: "secret".into(),
            },
            ..KafkaConfig::default()
        };
        let client = client_config(&config, MONITOR_GROUP);
        assert_eq!(client.get("sasl.password"), Some("secret"));
        assert_eq!(client.get("ssl.ca.location"), None);
    }
}
