//! Kafka reader of the wallet-projection topic.
//!
//! The projection service re-publishes every NATS wallet event onto a Kafka
//! (Redpanda) topic. [`KafkaProjectionSource`] implements
//! [`MessageSource`] for that topic, yielding decoded
//! [`ProjectionMessage`]s so tests can check that each projection mirrors
//! the NATS event with the same sequence number.
//!
//! # Delivery
//!
//! Subscriptions never join a consumer group. Each one assigns itself every
//! partition of the topic, so concurrent tests read independently and no
//! group is left behind on the broker. Offsets are never committed.
//!
//! [`MessageSource::subscribe`] starts at the beginning of each partition
//! (`earliest`, the default) or at its end (`latest`).
//! [`MessageSource::subscribe_since`] looks up, per partition, the first
//! record produced after `since` minus the configured rewind and starts
//! there. That keeps a mirror check on a long-lived topic from scanning every
//! earlier run's history.
//!
//! # Example
//!
//! ```no_run
//! use wallet_e2e_redpanda::KafkaProjectionSource;
//! use wallet_e2e_core::event_bus::MessageSource;
//! use wallet_e2e_core::expectation::Expectation;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kafka = KafkaProjectionSource::builder()
//!     .brokers("localhost:9092")
//!     .consumer_group_prefix("wallet-e2e")
//!     .build()?;
//!
//! let stream = kafka.subscribe("wallet-projections").await?;
//! let projection = Expectation::new(stream)
//!     .of_type("betted_from_gamble")
//!     .fetch()
//!     .await?;
//! println!("projection of sequence {}", projection.seq_number);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use chrono::{DateTime, Utc};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaResult;
use rdkafka::message::Message;
use rdkafka::metadata::MetadataPartition;
use rdkafka::topic_partition_list::{Offset, TopicPartitionList};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use uuid::Uuid;
use wallet_e2e_core::event_bus::{BusError, MessageSource, MessageStream};
use wallet_e2e_core::projection::ProjectionMessage;

/// Default number of records buffered between the consumer task and the
/// subscriber.
pub const DEFAULT_BUFFER_SIZE: usize = 1000;

/// Default start of [`MessageSource::subscribe`]: `earliest` or `latest`.
pub const DEFAULT_OFFSET_RESET: &str = "earliest";

/// Default prefix of generated consumer group ids.
pub const DEFAULT_GROUP_PREFIX: &str = "wallet-e2e";

/// Default margin subtracted from `since` before seeking, covering clock skew
/// between the NATS server and the Kafka producer.
pub const DEFAULT_REWIND: Duration = Duration::from_secs(5);

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a new subscription starts on every partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StartAt {
    Beginning,
    End,
    /// First record with a timestamp at or after these epoch milliseconds.
    Timestamp(i64),
}

/// Requested start offset of each partition.
///
/// For [`StartAt::Timestamp`] the offsets hold the timestamp and still have
/// to be resolved with `offsets_for_times`.
fn start_positions(
    topic: &str,
    partitions: &[i32],
    start: StartAt,
) -> KafkaResult<TopicPartitionList> {
    let offset = match start {
        StartAt::Beginning => Offset::Beginning,
        StartAt::End => Offset::End,
        StartAt::Timestamp(millis) => Offset::Offset(millis),
    };
    let mut positions = TopicPartitionList::with_capacity(partitions.len());
    for &partition in partitions {
        positions.add_partition_offset(topic, partition, offset)?;
    }
    Ok(positions)
}

/// Assign `consumer` every partition of `topic`, positioned at `start`.
///
/// Blocks on broker round-trips.
fn assign_partitions(
    consumer: &StreamConsumer,
    topic: &str,
    start: StartAt,
) -> Result<(), BusError> {
    let failed = |reason: String| BusError::SubscriptionFailed {
        subject: topic.to_string(),
        reason,
    };

    let metadata = consumer
        .fetch_metadata(Some(topic), METADATA_TIMEOUT)
        .map_err(|e| failed(format!("Failed to fetch metadata: {e}")))?;
    let partitions: Vec<i32> = metadata
        .topics()
        .iter()
        .filter(|t| t.name() == topic)
        .flat_map(|t| t.partitions().iter().map(MetadataPartition::id))
        .collect();
    if partitions.is_empty() {
        return Err(failed("topic has no partitions".to_string()));
    }

    let mut positions = start_positions(topic, &partitions, start)
        .map_err(|e| failed(format!("Invalid start position: {e}")))?;
    if matches!(start, StartAt::Timestamp(_)) {
        positions = consumer
            .offsets_for_times(positions, METADATA_TIMEOUT)
            .map_err(|e| failed(format!("Failed to look up offsets by time: {e}")))?;
    }

    consumer
        .assign(&positions)
        .map_err(|e| failed(format!("Failed to assign partitions: {e}")))?;
    tracing::debug!(topic, partitions = partitions.len(), ?start, "Partitions assigned");
    Ok(())
}

/// Reader of the wallet-projection topic.
///
/// Holds configuration only; each subscription creates its own rdkafka
/// consumer, owned by a spawned task that exits once the returned stream is
/// dropped.
#[derive(Debug, Clone)]
pub struct KafkaProjectionSource {
    brokers: String,
    consumer_group_prefix: String,
    buffer_size: usize,
    auto_offset_reset: String,
    rewind: Duration,
}

impl KafkaProjectionSource {
    /// Create a source with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ConnectionFailed`] if `brokers` is empty.
    pub fn new(brokers: &str) -> Result<Self, BusError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a new builder.
    #[must_use]
    pub fn builder() -> KafkaProjectionSourceBuilder {
        KafkaProjectionSourceBuilder::default()
    }

    /// Configured bootstrap servers.
    #[must_use]
    pub fn brokers(&self) -> &str {
        &self.brokers
    }

    /// Offset reset policy used by new subscriptions.
    #[must_use]
    pub fn auto_offset_reset(&self) -> &str {
        &self.auto_offset_reset
    }

    /// Margin subtracted from `since` by [`MessageSource::subscribe_since`].
    #[must_use]
    pub const fn rewind(&self) -> Duration {
        self.rewind
    }

    /// A consumer group id no other subscription uses.
    fn next_group_id(&self) -> String {
        format!("{}-{}", self.consumer_group_prefix, Uuid::new_v4())
    }

    fn start_for_policy(&self) -> StartAt {
        if self.auto_offset_reset.eq_ignore_ascii_case("latest") {
            StartAt::End
        } else {
            StartAt::Beginning
        }
    }

    fn start_since(&self, since: DateTime<Utc>) -> StartAt {
        let rewind =
            chrono::Duration::from_std(self.rewind).unwrap_or_else(|_| chrono::Duration::zero());
        StartAt::Timestamp((since - rewind).timestamp_millis().max(0))
    }

    fn open(
        &self,
        topic: &str,
        start: StartAt,
    ) -> Pin<Box<dyn Future<Output = Result<MessageStream<ProjectionMessage>, BusError>> + Send + '_>>
    {
        let topic = topic.to_string();
        let group_id = self.next_group_id();

        Box::pin(async move {
            let consumer: StreamConsumer = ClientConfig::new()
                .set("bootstrap.servers", &self.brokers)
                .set("group.id", &group_id)
                .set("enable.auto.commit", "false")
                .set("enable.auto.offset.store", "false")
                .set("auto.offset.reset", &self.auto_offset_reset)
                .set("enable.partition.eof", "false")
                .create()
                .map_err(|e| BusError::SubscriptionFailed {
                    subject: topic.clone(),
                    reason: format!("Failed to create consumer: {e}"),
                })?;

            let consumer = {
                let assigned_topic = topic.clone();
                tokio::task::spawn_blocking(move || {
                    assign_partitions(&consumer, &assigned_topic, start).map(|()| consumer)
                })
                .await
                .map_err(|e| BusError::SubscriptionFailed {
                    subject: topic.clone(),
                    reason: format!("Partition assignment task failed: {e}"),
                })??
            };

            tracing::info!(
                topic = %topic,
                consumer = %group_id,
                ?start,
                "Reading projection topic"
            );

            let (tx, rx) = tokio::sync::mpsc::channel(self.buffer_size);

            tokio::spawn(async move {
                use futures::StreamExt;

                let mut stream = consumer.stream();

                while let Some(received) = stream.next().await {
                    let decoded = match received {
                        Ok(message) => match message.payload() {
                            Some(payload) => ProjectionMessage::from_slice(payload)
                                .inspect(|projection| {
                                    tracing::trace!(
                                        partition = message.partition(),
                                        offset = message.offset(),
                                        event_type = %projection.event_type,
                                        seq_number = projection.seq_number,
                                        "Received projection"
                                    );
                                })
                                .map_err(|e| {
                                    BusError::DeserializationFailed(format!(
                                        "offset {} is not a projection record: {e}",
                                        message.offset()
                                    ))
                                }),
                            None => Err(BusError::DeserializationFailed(format!(
                                "offset {} has no payload",
                                message.offset()
                            ))),
                        },
                        Err(e) => Err(BusError::TransportError(format!(
                            "Failed to receive message: {e}"
                        ))),
                    };

                    if tx.send(decoded).await.is_err() {
                        break;
                    }
                }

                tracing::debug!(consumer_group = %group_id, "Projection consumer exiting");
            });

            let stream = async_stream::stream! {
                let mut rx = rx;
                while let Some(result) = rx.recv().await {
                    yield result;
                }
            };

            Ok(Box::pin(stream) as MessageStream<ProjectionMessage>)
        })
    }
}

/// Builder for a [`KafkaProjectionSource`].
#[derive(Debug, Default)]
pub struct KafkaProjectionSourceBuilder {
    brokers: Option<String>,
    consumer_group_prefix: Option<String>,
    buffer_size: Option<usize>,
    auto_offset_reset: Option<String>,
    rewind: Option<Duration>,
}

impl KafkaProjectionSourceBuilder {
    /// Comma-separated bootstrap servers (e.g. `"localhost:9092"`).
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Prefix of generated consumer group ids.
    ///
    /// Each subscription's consumer is named `{prefix}-{uuid}`. Default:
    /// `wallet-e2e`.
    #[must_use]
    pub fn consumer_group_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.consumer_group_prefix = Some(prefix.into());
        self
    }

    /// Records buffered per subscription. Zero is raised to one.
    ///
    /// Default: 1000.
    #[must_use]
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = Some(buffer_size.max(1));
        self
    }

    /// Where new consumer groups start reading: `"earliest"` or `"latest"`.
    ///
    /// Default: `"earliest"`.
    #[must_use]
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// How far before `since` a [`MessageSource::subscribe_since`] starts.
    ///
    /// Default: 5 seconds.
    #[must_use]
    pub const fn rewind(mut self, rewind: Duration) -> Self {
        self.rewind = Some(rewind);
        self
    }

    /// Build the [`KafkaProjectionSource`].
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ConnectionFailed`] if no brokers were configured.
    pub fn build(self) -> Result<KafkaProjectionSource, BusError> {
        let brokers = self
            .brokers
            .filter(|b| !b.trim().is_empty())
            .ok_or_else(|| BusError::ConnectionFailed("Kafka brokers not configured".to_string()))?;

        let source = KafkaProjectionSource {
            brokers,
            consumer_group_prefix: self
                .consumer_group_prefix
                .unwrap_or_else(|| DEFAULT_GROUP_PREFIX.to_string()),
            buffer_size: self.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE),
            auto_offset_reset: self
                .auto_offset_reset
                .unwrap_or_else(|| DEFAULT_OFFSET_RESET.to_string()),
            rewind: self.rewind.unwrap_or(DEFAULT_REWIND),
        };

        tracing::info!(
            brokers = %source.brokers,
            group_prefix = %source.consumer_group_prefix,
            buffer_size = source.buffer_size,
            auto_offset_reset = %source.auto_offset_reset,
            rewind_ms = source.rewind.as_millis(),
            "KafkaProjectionSource configured"
        );

        Ok(source)
    }
}

impl MessageSource for KafkaProjectionSource {
    type Message = ProjectionMessage;

    fn subscribe(
        &self,
        topic: &str,
    ) -> Pin<Box<dyn Future<Output = Result<MessageStream<ProjectionMessage>, BusError>> + Send + '_>>
    {
        self.open(topic, self.start_for_policy())
    }

    fn subscribe_since(
        &self,
        topic: &str,
        since: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<MessageStream<ProjectionMessage>, BusError>> + Send + '_>>
    {
        self.open(topic, self.start_since(since))
    }
}
