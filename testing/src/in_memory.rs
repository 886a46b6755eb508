//! In-memory [`MessageSource`] for tests that run without a broker.
//!
//! Messages are scripted per subject. A subscription replays everything
//! published on its subject so far, then follows live publications, which
//! matches the replay-from-start behaviour of the NATS and Kafka sources.
//! Streams stay open until the source is dropped, so expectations time out
//! rather than see the stream close.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use wallet_e2e_core::event_bus::{BusError, MessageSource, MessageStream};

const LIVE_CAPACITY: usize = 1024;

type Entry<M> = Result<M, BusError>;

#[derive(Debug)]
struct Inner<M> {
    history: HashMap<String, Vec<Entry<M>>>,
    subscriptions: usize,
}

/// Scripted message source.
///
/// # Example
///
/// ```ignore
/// let source = InMemoryMessageSource::new();
/// source.publish("wallet.wallet.v2.p.w", event);
///
/// let stream = source.subscribe("wallet.wallet.v2.p.w").await?;
/// let event = Expectation::new(stream).of_type("betted_from_gamble").fetch().await?;
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryMessageSource<M> {
    inner: Arc<Mutex<Inner<M>>>,
    live: broadcast::Sender<(String, Entry<M>)>,
}

impl<M: Clone + Send + 'static> InMemoryMessageSource<M> {
    /// An empty source.
    #[must_use]
    pub fn new() -> Self {
        let (live, _) = broadcast::channel(LIVE_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                history: HashMap::new(),
                subscriptions: 0,
            })),
            live,
        }
    }

    /// Publish a message on `subject`.
    pub fn publish(&self, subject: &str, message: M) {
        self.push(subject, Ok(message));
    }

    /// Publish a message that fails to decode.
    pub fn publish_error(&self, subject: &str, error: BusError) {
        self.push(subject, Err(error));
    }

    /// Messages published on `subject` so far, errors excluded.
    #[must_use]
    pub fn published(&self, subject: &str) -> Vec<M> {
        self.lock()
            .history
            .get(subject)
            .map(|entries| entries.iter().filter_map(|e| e.as_ref().ok().cloned()).collect())
            .unwrap_or_default()
    }

    /// Number of subscriptions made so far.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.lock().subscriptions
    }

    fn push(&self, subject: &str, entry: Entry<M>) {
        let mut inner = self.lock();
        inner
            .history
            .entry(subject.to_string())
            .or_default()
            .push(entry.clone());
        // No live subscribers is not an error: history covers late subscribers.
        let _ = self.live.send((subject.to_string(), entry));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner<M>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<M: Clone + Send + 'static> Default for InMemoryMessageSource<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Clone + Send + Sync + 'static> MessageSource for InMemoryMessageSource<M> {
    type Message = M;

    fn subscribe(
        &self,
        subject: &str,
    ) -> Pin<Box<dyn Future<Output = Result<MessageStream<M>, BusError>> + Send + '_>> {
        let subject = subject.to_string();
        Box::pin(async move {
            // Snapshot and live receiver are taken under the same lock so no
            // publication is missed or seen twice.
            let (replay, mut live) = {
                let mut inner = self.lock();
                inner.subscriptions += 1;
                let replay = inner.history.get(&subject).cloned().unwrap_or_default();
                (replay, self.live.subscribe())
            };

            tracing::debug!(subject = %subject, replayed = replay.len(), "In-memory subscription");

            let stream = async_stream::stream! {
                for entry in replay {
                    yield entry;
                }
                loop {
                    match live.recv().await {
                        Ok((published_on, entry)) if published_on == subject => yield entry,
                        Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            };

            Ok(Box::pin(stream) as MessageStream<M>)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn replays_history_then_follows_live() {
        let source = InMemoryMessageSource::<u32>::new();
        source.publish("a", 1);
        source.publish("b", 99);

        let mut stream = source.subscribe("a").await.unwrap();
        source.publish("a", 2);

        assert_eq!(stream.next().await.unwrap().unwrap(), 1);
        assert_eq!(stream.next().await.unwrap().unwrap(), 2);
        assert_eq!(source.subscription_count(), 1);
    }

    #[tokio::test]
    async fn errors_are_delivered_in_order() {
        let source = InMemoryMessageSource::<u32>::new();
        source.publish_error("a", BusError::DeserializationFailed("bad".to_string()));
        source.publish("a", 3);

        let mut stream = source.subscribe("a").await.unwrap();
        assert!(stream.next().await.unwrap().is_err());
        assert_eq!(stream.next().await.unwrap().unwrap(), 3);
        assert_eq!(source.published("a"), vec![3]);
    }
}
