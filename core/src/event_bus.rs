//! Message sources the suite listens on.
//!
//! The wallet platform publishes the same facts on two buses: NATS (one
//! subject per wallet, the source of truth) and Kafka (the projection topic
//! mirroring NATS sequence numbers). Both are read through [`MessageSource`],
//! which yields a stream of decoded messages for one subject or topic.
//!
//! # Implementations
//!
//! - `NatsEventSource` (`wallet-e2e-nats`): JetStream, `Message = WalletEvent`
//! - `KafkaProjectionSource` (`wallet-e2e-redpanda`): rdkafka, `Message = ProjectionMessage`
//! - `InMemoryMessageSource` (`wallet-e2e-testing`): scripted messages for offline tests
//!
//! # Example
//!
//! ```rust,ignore
//! use wallet_e2e_core::event_bus::MessageSource;
//! use wallet_e2e_core::expectation::Expectation;
//!
//! let stream = nats.subscribe(&subject).await?;
//! let event = Expectation::new(stream)
//!     .of_type("betted_from_gamble")
//!     .within(Duration::from_secs(30))
//!     .fetch()
//!     .await?;
//! ```

use chrono::{DateTime, Utc};
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while reading from a message source.
#[derive(Error, Debug, Clone)]
pub enum BusError {
    /// Failed to connect to the broker
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to subscribe to a subject or topic
    #[error("Subscription failed for '{subject}': {reason}")]
    SubscriptionFailed {
        /// Subject or topic
        subject: String,
        /// The reason for failure
        reason: String,
    },

    /// A message could not be decoded
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    /// Network or transport error
    #[error("Transport error: {0}")]
    TransportError(String),

    /// No matching message arrived in time
    #[error("Timed out after {waited:?} waiting for {what} ({skipped} non-matching messages skipped)")]
    Timeout {
        /// Description of the awaited message
        what: String,
        /// How long the wait lasted
        waited: Duration,
        /// Messages seen that did not match
        skipped: usize,
    },

    /// A message arrived that should not have
    #[error("Unexpected message: {0}")]
    UnexpectedMessage(String),

    /// The stream ended before a matching message arrived
    #[error("Stream closed while waiting for {0}")]
    StreamClosed(String),
}

/// Stream of decoded messages from a subscription.
pub type MessageStream<M> = Pin<Box<dyn Stream<Item = Result<M, BusError>> + Send>>;

/// Common view over messages from either bus, used by expectation filters.
pub trait TypedMessage {
    /// Event type name (`betted_from_gamble`, ...).
    fn type_name(&self) -> &str;

    /// Sequence number the message carries.
    fn sequence(&self) -> u64;
}

/// A subscribable source of messages.
///
/// Uses explicit `Pin<Box<dyn Future>>` returns so sources can be held as
/// `Arc<dyn MessageSource<Message = ...>>`.
pub trait MessageSource: Send + Sync {
    /// Decoded message type.
    type Message: Send + 'static;

    /// Subscribe to a subject (NATS) or topic (Kafka).
    ///
    /// Messages already on the stream when the subscription is made are
    /// delivered first.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::SubscriptionFailed`] if the subscription cannot be
    /// created.
    fn subscribe(
        &self,
        subject: &str,
    ) -> Pin<Box<dyn Future<Output = Result<MessageStream<Self::Message>, BusError>> + Send + '_>>;

    /// Subscribe, skipping messages published well before `since`.
    ///
    /// Sources that cannot seek replay from wherever [`subscribe`] starts.
    ///
    /// [`subscribe`]: MessageSource::subscribe
    ///
    /// # Errors
    ///
    /// Returns [`BusError::SubscriptionFailed`] if the subscription cannot be
    /// created.
    fn subscribe_since(
        &self,
        subject: &str,
        since: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<MessageStream<Self::Message>, BusError>> + Send + '_>>
    {
        let _ = since;
        self.subscribe(subject)
    }
}
