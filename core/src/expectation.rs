//! Bounded waits for messages on a [`MessageStream`].
//!
//! An [`Expectation`] wraps a subscription and a set of filters. It reads the
//! stream until a message passes every filter or the deadline expires.
//! Messages that fail a filter are counted and dropped; stream errors on
//! individual messages are logged and skipped.
//!
//! ```rust,ignore
//! let bet = Expectation::new(nats.subscribe(&subject).await?)
//!     .of_type("betted_from_gamble")
//!     .matching(|e: &WalletEvent| e.concerns_transaction(&tx_id))
//!     .within(Duration::from_secs(30))
//!     .fetch()
//!     .await?;
//! ```

use crate::event_bus::{BusError, MessageStream, TypedMessage};
use futures::StreamExt;
use std::fmt::Write as _;
use std::time::Duration;
use tokio::time::Instant;

/// Default wait when `within` is not called.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type Predicate<M> = Box<dyn Fn(&M) -> bool + Send + Sync>;

/// A pending wait for one or more matching messages.
#[must_use = "an expectation does nothing until fetched"]
pub struct Expectation<M> {
    stream: MessageStream<M>,
    event_type: Option<String>,
    predicates: Vec<Predicate<M>>,
    min_sequence: Option<u64>,
    timeout: Duration,
    description: Option<String>,
}

impl<M> std::fmt::Debug for Expectation<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expectation")
            .field("event_type", &self.event_type)
            .field("predicates", &self.predicates.len())
            .field("min_sequence", &self.min_sequence)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<M: TypedMessage + Send + 'static> Expectation<M> {
    /// Wrap a subscription.
    pub fn new(stream: MessageStream<M>) -> Self {
        Self {
            stream,
            event_type: None,
            predicates: Vec::new(),
            min_sequence: None,
            timeout: DEFAULT_TIMEOUT,
            description: None,
        }
    }

    /// Only accept messages of this type.
    pub fn of_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Only accept messages satisfying `predicate`. May be called repeatedly.
    pub fn matching<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Only accept messages with a sequence number of at least `sequence`.
    pub fn after_sequence(mut self, sequence: u64) -> Self {
        self.min_sequence = Some(sequence);
        self
    }

    /// How long to wait.
    pub fn within(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Label used in timeout errors instead of the generated one.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Wait for the first matching message.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Timeout`] if nothing matches before the deadline, or
    /// [`BusError::StreamClosed`] if the subscription ends first.
    pub async fn fetch(mut self) -> Result<M, BusError> {
        let deadline = Instant::now() + self.timeout;
        let mut skipped = 0;
        match self.next_match(deadline, &mut skipped).await? {
            Some(message) => Ok(message),
            None => Err(self.timeout_error(skipped)),
        }
    }

    /// Wait for the first `count` matching messages.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Timeout`] if fewer than `count` messages match
    /// before the deadline, or [`BusError::StreamClosed`] if the subscription
    /// ends first.
    pub async fn fetch_all(mut self, count: usize) -> Result<Vec<M>, BusError> {
        let deadline = Instant::now() + self.timeout;
        let mut skipped = 0;
        let mut matched = Vec::with_capacity(count);
        while matched.len() < count {
            match self.next_match(deadline, &mut skipped).await? {
                Some(message) => matched.push(message),
                None => {
                    tracing::warn!(
                        expected = count,
                        received = matched.len(),
                        "Expectation window closed early"
                    );
                    return Err(self.timeout_error(skipped));
                }
            }
        }
        Ok(matched)
    }

    /// Succeed only if no matching message arrives within the window.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::UnexpectedMessage`] describing the first message
    /// that matched.
    pub async fn assert_none(mut self) -> Result<(), BusError> {
        let deadline = Instant::now() + self.timeout;
        let mut skipped = 0;
        match self.next_match(deadline, &mut skipped).await {
            Ok(None) | Err(BusError::StreamClosed(_)) => {
                tracing::debug!(skipped, what = %self.what(), "No matching message, as expected");
                Ok(())
            }
            Ok(Some(message)) => Err(BusError::UnexpectedMessage(format!(
                "{} (sequence {})",
                message.type_name(),
                message.sequence()
            ))),
            Err(e) => Err(e),
        }
    }

    /// Next message passing all filters, `None` once the deadline passes.
    async fn next_match(
        &mut self,
        deadline: Instant,
        skipped: &mut usize,
    ) -> Result<Option<M>, BusError> {
        loop {
            match tokio::time::timeout_at(deadline, self.stream.next()).await {
                Err(_) => return Ok(None),
                Ok(None) => return Err(BusError::StreamClosed(self.what())),
                Ok(Some(Err(e))) => {
                    tracing::warn!(error = %e, "Skipping undecodable message");
                }
                Ok(Some(Ok(message))) => {
                    if self.accepts(&message) {
                        tracing::debug!(
                            event_type = message.type_name(),
                            sequence = message.sequence(),
                            skipped = *skipped,
                            "Expectation matched"
                        );
                        return Ok(Some(message));
                    }
                    *skipped += 1;
                }
            }
        }
    }

    fn accepts(&self, message: &M) -> bool {
        self.event_type
            .as_deref()
            .is_none_or(|wanted| message.type_name() == wanted)
            && self.min_sequence.is_none_or(|min| message.sequence() >= min)
            && self.predicates.iter().all(|p| p(message))
    }

    fn what(&self) -> String {
        if let Some(description) = &self.description {
            return description.clone();
        }
        let mut what = self
            .event_type
            .clone()
            .unwrap_or_else(|| "any message".to_string());
        if let Some(min) = self.min_sequence {
            let _ = write!(what, " with sequence >= {min}");
        }
        if !self.predicates.is_empty() {
            let _ = write!(what, " matching {} predicate(s)", self.predicates.len());
        }
        what
    }

    fn timeout_error(&self, skipped: usize) -> BusError {
        BusError::Timeout {
            what: self.what(),
            waited: self.timeout,
            skipped,
        }
    }
}
