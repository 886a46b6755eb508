//! Wallet projection messages published on Kafka.
//!
//! The projection service re-publishes every NATS wallet event onto the
//! wallet-projection topic. The envelope carries the NATS stream sequence as
//! `seq_number` and the original NATS payload as a JSON-encoded string, so a
//! projection can be checked field by field against the event it mirrors.

use crate::event::{WalletEvent, WalletEventType};
use crate::event_bus::TypedMessage;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One record of the wallet-projection topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionMessage {
    /// Event name, same as the NATS `type` header
    #[serde(rename = "type")]
    pub event_type: String,
    /// NATS stream sequence of the mirrored event
    pub seq_number: u64,
    /// Wallet the event belongs to
    pub wallet_uuid: Uuid,
    /// Owning player
    pub player_uuid: Uuid,
    /// Node (brand) of the player
    #[serde(default)]
    pub node_uuid: Option<Uuid>,
    /// Wallet currency
    #[serde(default)]
    pub currency: String,
    /// Unix timestamp (seconds)
    #[serde(default)]
    pub timestamp: i64,
    /// JSON-encoded NATS payload
    pub payload: String,
}

impl ProjectionMessage {
    /// Decode a record value.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if the bytes are not a
    /// projection envelope.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// The event name as a [`WalletEventType`].
    #[must_use]
    pub fn wallet_event_type(&self) -> WalletEventType {
        WalletEventType::from(self.event_type.as_str())
    }

    /// The embedded NATS payload, parsed.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] if `payload` is not JSON.
    pub fn payload_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }

    /// Whether this record mirrors `event`: same type, same sequence and a
    /// payload that parses to the same JSON value.
    #[must_use]
    pub fn mirrors(&self, event: &WalletEvent) -> bool {
        self.event_type == event.event_type.as_str()
            && self.seq_number == event.sequence
            && self
                .payload_json()
                .is_ok_and(|payload| payload == event.payload)
    }
}

impl TypedMessage for ProjectionMessage {
    fn type_name(&self) -> &str {
        &self.event_type
    }

    fn sequence(&self) -> u64 {
        self.seq_number
    }
}
