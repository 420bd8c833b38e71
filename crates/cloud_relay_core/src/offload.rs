//! Size-bounded queue publishing.
//!
//! A message is wrapped in an [`Envelope`] and measured. Envelopes below the
//! policy threshold go to the queue as-is. Anything at or above it has its
//! body written to the overflow store first, and the queue receives an
//! envelope that only carries the object key.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::envelope::Envelope;
use crate::identifier::generate_unique_string;
use crate::transport::{
    BoxError, OutboundMessage, OverflowReader, OverflowStore, QueueTransport, SendAck,
};

/// Documented per-message ceiling of the managed queue.
pub const DEFAULT_THRESHOLD_BYTES: usize = 256 * 1024;
pub const DEFAULT_KEY_PREFIX: &str = "cl-";
pub const OVERFLOW_KEY_SUFFIX: &str = ".json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffloadPolicy {
    pub threshold_bytes: usize,
    pub key_prefix: String,
    pub disabled: bool,
}

impl Default for OffloadPolicy {
    fn default() -> Self {
        Self {
            threshold_bytes: DEFAULT_THRESHOLD_BYTES,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            disabled: false,
        }
    }
}

impl OffloadPolicy {
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    pub fn overflow_key(&self, identifier: &str) -> String {
        format!("{}{identifier}{OVERFLOW_KEY_SUFFIX}", self.key_prefix)
    }
}

pub struct QueueMessage<'a, T: ?Sized> {
    pub destination: &'a str,
    pub group_key: &'a str,
    pub kind: &'a str,
    pub body: &'a T,
}

impl<T: ?Sized> Clone for QueueMessage<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for QueueMessage<'_, T> {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub ack: SendAck,
    pub dedup_token: String,
    pub offload_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The transport is disabled; nothing was sent.
    Skipped,
    Sent(Delivery),
}

impl PublishOutcome {
    pub fn delivery(&self) -> Option<&Delivery> {
        match self {
            Self::Skipped => None,
            Self::Sent(delivery) => Some(delivery),
        }
    }
}

#[derive(Debug, Error)]
pub enum OffloadError {
    #[error("message body could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("offloaded envelope is {size} bytes, threshold is {threshold} bytes")]
    EnvelopeTooLarge { size: usize, threshold: usize },
    #[error("failed to write overflow object '{key}': {source}")]
    StorageWrite {
        key: String,
        #[source]
        source: BoxError,
    },
    #[error("failed to send message to queue: {source}")]
    TransportSend {
        #[source]
        source: BoxError,
    },
}

pub async fn publish_to_queue<T>(
    message: QueueMessage<'_, T>,
    policy: &OffloadPolicy,
    store: &dyn OverflowStore,
    transport: &dyn QueueTransport,
) -> Result<PublishOutcome, OffloadError>
where
    T: Serialize + ?Sized,
{
    if policy.disabled {
        tracing::debug!(
            component = "queue_offload",
            event = "publish_skipped",
            kind = message.kind,
        );
        return Ok(PublishOutcome::Skipped);
    }

    let body = serde_json::to_value(message.body)?;
    let dedup_token = generate_unique_string();
    let candidate = Envelope::inline(message.kind, body);
    let candidate_wire = candidate.to_wire()?;

    if candidate_wire.len() < policy.threshold_bytes {
        let ack = submit(message, candidate_wire, &dedup_token, transport).await?;
        return Ok(PublishOutcome::Sent(Delivery {
            ack,
            dedup_token,
            offload_key: None,
        }));
    }

    // The inline token is never reused for the offloaded submission.
    let dedup_token = generate_unique_string();
    let offload_key = policy.overflow_key(&dedup_token);
    let replacement_wire = Envelope::offloaded(message.kind, offload_key.as_str()).to_wire()?;
    if replacement_wire.len() >= policy.threshold_bytes {
        return Err(OffloadError::EnvelopeTooLarge {
            size: replacement_wire.len(),
            threshold: policy.threshold_bytes,
        });
    }

    tracing::info!(
        component = "queue_offload",
        event = "payload_offloaded",
        kind = message.kind,
        size_bytes = candidate_wire.len(),
        threshold_bytes = policy.threshold_bytes,
        offload_key = offload_key.as_str(),
    );

    let Envelope { payload, .. } = candidate;
    let overflow_body = serde_json::to_vec(&payload)?;
    store
        .put_object(&offload_key, overflow_body)
        .await
        .map_err(|source| OffloadError::StorageWrite {
            key: offload_key.clone(),
            source,
        })?;

    let ack = submit(message, replacement_wire, &dedup_token, transport).await?;
    Ok(PublishOutcome::Sent(Delivery {
        ack,
        dedup_token,
        offload_key: Some(offload_key),
    }))
}

async fn submit<T: ?Sized>(
    message: QueueMessage<'_, T>,
    body: String,
    dedup_token: &str,
    transport: &dyn QueueTransport,
) -> Result<SendAck, OffloadError> {
    let ack = transport
        .send(OutboundMessage {
            destination: message.destination.to_string(),
            body,
            partition_key: message.group_key.to_string(),
            dedup_token: dedup_token.to_string(),
        })
        .await
        .map_err(|source| OffloadError::TransportSend { source })?;

    tracing::debug!(
        component = "queue_offload",
        event = "message_sent",
        kind = message.kind,
        message_id = ack.message_id.as_str(),
    );
    Ok(ack)
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid envelope: {0}")]
    Shape(#[from] crate::envelope::EnvelopeShapeError),
    #[error("overflow object '{key}' is not valid json: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read overflow object '{key}': {source}")]
    StorageRead {
        key: String,
        #[source]
        source: BoxError,
    },
}

/// Returns the payload the producer originally handed to [`publish_to_queue`].
pub async fn resolve_payload(
    envelope: &Envelope,
    reader: &dyn OverflowReader,
) -> Result<Value, ResolveError> {
    envelope.validate()?;
    if !envelope.is_offloaded() {
        return Ok(envelope.payload.clone());
    }

    let key = envelope.offload_key.as_str();
    let bytes = reader
        .get_object(key)
        .await
        .map_err(|source| ResolveError::StorageRead {
            key: key.to_string(),
            source,
        })?;

    serde_json::from_slice(&bytes).map_err(|source| ResolveError::Decode {
        key: key.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use serde_json::json;

    use crate::test_support::{CapturingStore, CapturingTransport};

    use super::*;

    fn message<'a>(body: &'a Value) -> QueueMessage<'a, Value> {
        QueueMessage {
            destination: "https://sqs.eu-west-2.amazonaws.com/123/entries.fifo",
            group_key: "entries",
            kind: "entry-submitted",
            body,
        }
    }

    fn small_threshold(threshold_bytes: usize) -> OffloadPolicy {
        OffloadPolicy {
            threshold_bytes,
            ..OffloadPolicy::default()
        }
    }

    fn sent_envelope(transport: &CapturingTransport, index: usize) -> Envelope {
        let sent = transport.messages();
        Envelope::from_wire(&sent[index].body).expect("sent body should be an envelope")
    }

    #[tokio::test]
    async fn small_body_is_sent_inline() {
        let store = CapturingStore::new();
        let transport = CapturingTransport::new();
        let body = json!({"a": "x"});

        let outcome = publish_to_queue(message(&body), &small_threshold(1024), &store, &transport)
            .await
            .expect("publish should succeed");

        let delivery = outcome.delivery().expect("message should be sent");
        assert_eq!(delivery.offload_key, None);
        assert!(store.writes().is_empty());

        let envelope = sent_envelope(&transport, 0);
        assert_eq!(envelope.payload, body);
        assert_eq!(envelope.offload_key, "");
        assert_eq!(envelope.original_kind, "entry-submitted");

        let sent = transport.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].partition_key, "entries");
        assert_eq!(sent[0].dedup_token, delivery.dedup_token);
    }

    #[tokio::test]
    async fn oversized_body_is_written_to_overflow_store() {
        let store = CapturingStore::new();
        let transport = CapturingTransport::new();
        let body = json!({
            "passportNo": "CLE-XXXXXXA",
            "message": "a".repeat(300_000),
        });

        let outcome = publish_to_queue(
            message(&body),
            &OffloadPolicy::default(),
            &store,
            &transport,
        )
        .await
        .expect("publish should succeed");
        let delivery = outcome.delivery().expect("message should be sent");

        let writes = store.writes();
        assert_eq!(writes.len(), 1);
        let stored: Value =
            serde_json::from_slice(&writes[0].1).expect("overflow object should be json");
        assert_eq!(stored, body);

        let envelope = sent_envelope(&transport, 0);
        assert_eq!(envelope.payload, json!({}));
        assert_eq!(envelope.offload_key, writes[0].0);
        assert_eq!(delivery.offload_key.as_deref(), Some(writes[0].0.as_str()));

        let key = &writes[0].0;
        assert!(key.starts_with(DEFAULT_KEY_PREFIX));
        assert!(key.ends_with(OVERFLOW_KEY_SUFFIX));
        assert_eq!(
            key.as_str(),
            format!("cl-{}.json", delivery.dedup_token).as_str()
        );
        assert!(transport.messages()[0].body.len() < DEFAULT_THRESHOLD_BYTES);
    }

    #[tokio::test]
    async fn envelope_exactly_at_threshold_is_offloaded() {
        let body = json!({"a": "x"});
        let wire_len = Envelope::inline("entry-submitted", body.clone())
            .to_wire()
            .expect("should serialize")
            .len();

        let store = CapturingStore::new();
        let transport = CapturingTransport::new();
        publish_to_queue(message(&body), &small_threshold(wire_len), &store, &transport)
            .await
            .expect("publish should succeed");

        assert_eq!(store.writes().len(), 1);
        assert!(sent_envelope(&transport, 0).is_offloaded());
    }

    #[tokio::test]
    async fn dedup_token_changes_between_identical_calls() {
        let store = CapturingStore::new();
        let transport = CapturingTransport::new();
        let body = json!({"a": "x"});
        let policy = OffloadPolicy::default();

        publish_to_queue(message(&body), &policy, &store, &transport)
            .await
            .expect("first publish should succeed");
        publish_to_queue(message(&body), &policy, &store, &transport)
            .await
            .expect("second publish should succeed");

        let sent = transport.messages();
        assert_ne!(sent[0].dedup_token, sent[1].dedup_token);
    }

    #[tokio::test]
    async fn empty_body_is_sent_inline_without_offload_key() {
        let store = CapturingStore::new();
        let transport = CapturingTransport::new();
        let body = json!({});

        let outcome = publish_to_queue(message(&body), &OffloadPolicy::default(), &store, &transport)
            .await
            .expect("publish should succeed");

        assert_eq!(outcome.delivery().and_then(|d| d.offload_key.clone()), None);
        assert!(store.writes().is_empty());

        let envelope = sent_envelope(&transport, 0);
        assert_eq!(envelope.payload, json!({}));
        assert_eq!(envelope.offload_key, "");
        assert!(!envelope.is_offloaded());
        assert!(envelope.validate().is_ok());
    }

    #[tokio::test]
    async fn disabled_policy_skips_all_collaborators() {
        let store = CapturingStore::new();
        let transport = CapturingTransport::new();
        let body = json!({"message": "a".repeat(300_000)});

        let outcome = publish_to_queue(message(&body), &OffloadPolicy::disabled(), &store, &transport)
            .await
            .expect("disabled publish should succeed");

        assert_eq!(outcome, PublishOutcome::Skipped);
        assert!(store.writes().is_empty());
        assert!(transport.messages().is_empty());
    }

    #[tokio::test]
    async fn store_failure_prevents_queue_send() {
        let store = CapturingStore::failing("bucket unavailable");
        let transport = CapturingTransport::new();
        let body = json!({"message": "a".repeat(2_048)});

        let error = publish_to_queue(message(&body), &small_threshold(1024), &store, &transport)
            .await
            .expect_err("store failure should fail the publish");

        assert!(matches!(error, OffloadError::StorageWrite { .. }));
        assert!(error.to_string().contains("bucket unavailable"));
        assert!(transport.messages().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_is_reported() {
        let store = CapturingStore::new();
        let transport = CapturingTransport::failing("queue throttled");
        let body = json!({"a": "x"});

        let error = publish_to_queue(
            message(&body),
            &OffloadPolicy::default(),
            &store,
            &transport,
        )
        .await
        .expect_err("transport failure should fail the publish");

        assert!(matches!(error, OffloadError::TransportSend { .. }));
        assert!(error.to_string().contains("queue throttled"));
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("body is not representable"))
        }
    }

    #[tokio::test]
    async fn unserializable_body_fails_before_network() {
        let store = CapturingStore::new();
        let transport = CapturingTransport::new();

        let error = publish_to_queue(
            QueueMessage {
                destination: "queue",
                group_key: "group",
                kind: "kind",
                body: &Unserializable,
            },
            &OffloadPolicy::default(),
            &store,
            &transport,
        )
        .await
        .expect_err("serialization should fail");

        assert!(matches!(error, OffloadError::Serialization(_)));
        assert!(store.writes().is_empty());
        assert!(transport.messages().is_empty());
    }

    #[tokio::test]
    async fn oversized_kind_is_rejected_before_store_write() {
        let store = CapturingStore::new();
        let transport = CapturingTransport::new();
        let body = json!({"a": "x"});
        let kind = "k".repeat(512);

        let error = publish_to_queue(
            QueueMessage {
                destination: "queue",
                group_key: "group",
                kind: &kind,
                body: &body,
            },
            &small_threshold(256),
            &store,
            &transport,
        )
        .await
        .expect_err("replacement envelope cannot fit");

        assert!(matches!(error, OffloadError::EnvelopeTooLarge { .. }));
        assert!(store.writes().is_empty());
        assert!(transport.messages().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_small_publishes_use_distinct_tokens() {
        let store = Arc::new(CapturingStore::new());
        let transport = Arc::new(CapturingTransport::new());
        let policy = Arc::new(OffloadPolicy::default());

        let mut tasks = tokio::task::JoinSet::new();
        for index in 0..500 {
            let store = Arc::clone(&store);
            let transport = Arc::clone(&transport);
            let policy = Arc::clone(&policy);
            tasks.spawn(async move {
                let body = json!({
                    "passportNo": format!("CLE-123456-{index}"),
                    "message": "Hello from the queue!",
                });
                publish_to_queue(message(&body), &policy, store.as_ref(), transport.as_ref()).await
            });
        }

        let mut acknowledged = 0usize;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .expect("publish task should not panic")
                .expect("publish should succeed");
            assert!(!outcome
                .delivery()
                .expect("message should be sent")
                .ack
                .message_id
                .is_empty());
            acknowledged += 1;
        }

        let tokens: HashSet<String> = transport
            .messages()
            .into_iter()
            .map(|sent| sent.dedup_token)
            .collect();
        assert_eq!(acknowledged, 500);
        assert_eq!(tokens.len(), 500);
        assert!(store.writes().is_empty());
    }

    #[tokio::test]
    async fn resolves_offloaded_payload_through_reader() {
        let store = CapturingStore::new();
        let transport = CapturingTransport::new();
        let body = json!({"message": "b".repeat(4_096)});

        publish_to_queue(message(&body), &small_threshold(1024), &store, &transport)
            .await
            .expect("publish should succeed");

        let envelope = sent_envelope(&transport, 0);
        let resolved = resolve_payload(&envelope, &store)
            .await
            .expect("payload should resolve");
        assert_eq!(resolved, body);
    }

    #[tokio::test]
    async fn resolve_reports_missing_overflow_object() {
        let store = CapturingStore::new();
        let envelope = Envelope::offloaded("kind", "cl-missing.json");

        let error = resolve_payload(&envelope, &store)
            .await
            .expect_err("missing object should fail");

        assert!(matches!(error, ResolveError::StorageRead { ref key, .. } if key == "cl-missing.json"));
    }
}
