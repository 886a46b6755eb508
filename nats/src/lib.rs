//! NATS JetStream reader of per-wallet event subjects.
//!
//! The wallet service publishes every state change on
//! `{prefix}.wallet.v2.{player}.{wallet}` with the event name in the `type`
//! header. [`NatsEventSource`] implements [`MessageSource`] for those
//! subjects and yields [`WalletEvent`]s carrying the JetStream stream
//! sequence, which the Kafka projection and the Redis aggregate both refer
//! back to.
//!
//! Each subscription is an ephemeral ordered consumer with
//! `DeliverPolicy::All`, so events published before the test subscribed are
//! delivered too.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use async_nats::jetstream;
use async_nats::jetstream::consumer::DeliverPolicy;
use async_nats::jetstream::consumer::pull::OrderedConfig;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use wallet_e2e_core::event::{WalletEvent, WalletEventType};
use wallet_e2e_core::event_bus::{BusError, MessageSource, MessageStream};

/// Header carrying the event name.
pub const TYPE_HEADER: &str = "type";

/// Events buffered per subscription.
const BUFFER_SIZE: usize = 256;

/// JetStream reader bound to one stream.
#[derive(Clone)]
pub struct NatsEventSource {
    stream: jetstream::stream::Stream,
    stream_name: String,
}

impl std::fmt::Debug for NatsEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NatsEventSource")
            .field("stream", &self.stream_name)
            .finish_non_exhaustive()
    }
}

impl NatsEventSource {
    /// Connect to `url` and look up the JetStream stream `stream`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ConnectionFailed`] if the server is unreachable or
    /// the stream does not exist.
    pub async fn connect(url: &str, stream: &str) -> Result<Self, BusError> {
        let client = async_nats::connect(url)
            .await
            .map_err(|e| BusError::ConnectionFailed(format!("NATS {url}: {e}")))?;
        let context = jetstream::new(client);
        let handle = context
            .get_stream(stream)
            .await
            .map_err(|e| BusError::ConnectionFailed(format!("JetStream stream {stream}: {e}")))?;

        tracing::info!(url = %url, stream = %stream, "Connected to NATS JetStream");

        Ok(Self {
            stream: handle,
            stream_name: stream.to_string(),
        })
    }

    /// Name of the JetStream stream read from.
    #[must_use]
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }
}

impl MessageSource for NatsEventSource {
    type Message = WalletEvent;

    fn subscribe(
        &self,
        subject: &str,
    ) -> Pin<Box<dyn Future<Output = Result<MessageStream<WalletEvent>, BusError>> + Send + '_>> {
        let subject = subject.to_string();

        Box::pin(async move {
            let consumer = self
                .stream
                .create_consumer(OrderedConfig {
                    filter_subject: subject.clone(),
                    deliver_policy: DeliverPolicy::All,
                    ..Default::default()
                })
                .await
                .map_err(|e| BusError::SubscriptionFailed {
                    subject: subject.clone(),
                    reason: format!("Failed to create ordered consumer: {e}"),
                })?;

            let messages = consumer
                .messages()
                .await
                .map_err(|e| BusError::SubscriptionFailed {
                    subject: subject.clone(),
                    reason: format!("Failed to open message stream: {e}"),
                })?;

            tracing::info!(subject = %subject, stream = %self.stream_name, "Subscribed to wallet subject");

            let (tx, rx) = tokio::sync::mpsc::channel(BUFFER_SIZE);

            tokio::spawn(async move {
                use futures::StreamExt;

                let mut messages = Box::pin(messages);

                while let Some(received) = messages.next().await {
                    let decoded = match received {
                        Ok(message) => match message.info() {
                            Ok(info) => {
                                let event_type = message
                                    .headers
                                    .as_ref()
                                    .and_then(|headers| headers.get(TYPE_HEADER))
                                    .map(|value| value.as_str());
                                let published = DateTime::from_timestamp(
                                    info.published.unix_timestamp(),
                                    info.published.nanosecond(),
                                );
                                decode_event(
                                    message.subject.as_str(),
                                    event_type,
                                    info.stream_sequence,
                                    &message.payload,
                                    published,
                                )
                            }
                            Err(e) => Err(BusError::DeserializationFailed(format!(
                                "message on {} has no JetStream metadata: {e}",
                                message.subject
                            ))),
                        },
                        Err(e) => Err(BusError::TransportError(format!(
                            "Failed to receive message: {e}"
                        ))),
                    };

                    if let Ok(event) = &decoded {
                        tracing::trace!(
                            subject = %event.subject,
                            sequence = event.sequence,
                            event_type = %event.event_type,
                            "Received wallet event"
                        );
                    }

                    if tx.send(decoded).await.is_err() {
                        break;
                    }
                }

                tracing::debug!(subject = %subject, "Wallet subject consumer exiting");
            });

            let stream = async_stream::stream! {
                let mut rx = rx;
                while let Some(result) = rx.recv().await {
                    yield result;
                }
            };

            Ok(Box::pin(stream) as MessageStream<WalletEvent>)
        })
    }
}

/// Build a [`WalletEvent`] from the parts of a JetStream message.
///
/// # Errors
///
/// Returns [`BusError::DeserializationFailed`] if the `type` header is
/// missing or the body is not JSON.
pub fn decode_event(
    subject: &str,
    event_type: Option<&str>,
    sequence: u64,
    payload: &[u8],
    timestamp: Option<DateTime<Utc>>,
) -> Result<WalletEvent, BusError> {
    let event_type = event_type.filter(|t| !t.is_empty()).ok_or_else(|| {
        BusError::DeserializationFailed(format!(
            "sequence {sequence} on {subject} has no '{TYPE_HEADER}' header"
        ))
    })?;
    let payload = serde_json::from_slice(payload).map_err(|e| {
        BusError::DeserializationFailed(format!(
            "{event_type} (sequence {sequence}) body is not JSON: {e}"
        ))
    })?;

    Ok(WalletEvent {
        event_type: WalletEventType::from(event_type),
        sequence,
        subject: subject.to_string(),
        payload,
        timestamp,
    })
}
