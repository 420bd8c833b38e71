//! Collaborator seams for the relay.
//!
//! The core never talks to a provider directly. Object storage, the queue and
//! the event bus are reached through these traits; `cloud_relay_aws` binds
//! them to the AWS SDK and tests bind them to in-memory fakes.

use async_trait::async_trait;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[async_trait]
pub trait OverflowStore: Send + Sync {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), BoxError>;
}

#[async_trait]
pub trait OverflowReader: Send + Sync {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, BoxError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub destination: String,
    pub body: String,
    pub partition_key: String,
    pub dedup_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendAck {
    pub message_id: String,
    pub sequence_number: Option<String>,
}

#[async_trait]
pub trait QueueTransport: Send + Sync {
    async fn send(&self, message: OutboundMessage) -> Result<SendAck, BoxError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventEntry {
    pub event_bus: String,
    pub source: String,
    pub detail_type: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAck {
    pub event_id: Option<String>,
    pub failed_entry_count: i32,
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn put_event(&self, entry: EventEntry) -> Result<EventAck, BoxError>;
}
