//! Queue-to-event-bus relay.
//!
//! Each record of an SQS batch carries an [`Envelope`]. The relay restores
//! the original payload (reading the overflow object when the envelope was
//! offloaded) and republishes it on the event bus under the envelope's
//! original kind. An offloaded payload too large for a bus entry is
//! republished as an `{"s3Key": ...}` pointer instead.

use std::time::Instant;

use chrono::Utc;
use cloud_relay_core::envelope::Envelope;
use cloud_relay_core::events::{
    build_event_entry, estimated_entry_size_kb, publish_event, EventError, EventOutcome,
    EventTarget, EVENT_SIZE_LIMIT_KB,
};
use cloud_relay_core::offload::{resolve_payload, ResolveError};
use cloud_relay_core::transport::{EventPublisher, OverflowReader};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub event_bus: String,
    pub event_source: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelaySummary {
    pub status: String,
    pub records_received: usize,
    pub records_relayed: usize,
    pub processed_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueRecord {
    pub message_id: String,
    pub envelope: Envelope,
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("event is not an SQS batch")]
    NotQueueEvent,
    #[error("SQS record {index} body must be a string")]
    RecordBody { index: usize },
    #[error("SQS record {message_id} is not a relay envelope: {source}")]
    Envelope {
        message_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("SQS record {message_id} could not be resolved: {source}")]
    Resolve {
        message_id: String,
        #[source]
        source: ResolveError,
    },
    #[error("SQS record {message_id} detail could not be serialized: {source}")]
    Detail {
        message_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("SQS record {message_id} could not be published: {source}")]
    Publish {
        message_id: String,
        #[source]
        source: EventError,
    },
}

pub fn is_sqs_event(event: &Value) -> bool {
    event
        .get("Records")
        .and_then(Value::as_array)
        .map(|records| {
            !records.is_empty()
                && records.iter().all(|record| {
                    record
                        .get("eventSource")
                        .and_then(Value::as_str)
                        .map(|source| source == "aws:sqs")
                        .unwrap_or(false)
                })
        })
        .unwrap_or(false)
}

pub fn decode_queue_records(event: &Value) -> Result<Vec<QueueRecord>, RelayError> {
    if !is_sqs_event(event) {
        return Err(RelayError::NotQueueEvent);
    }
    let records = event
        .get("Records")
        .and_then(Value::as_array)
        .ok_or(RelayError::NotQueueEvent)?;

    let mut decoded = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let message_id = record
            .get("messageId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{index}"));
        let body = record
            .get("body")
            .and_then(Value::as_str)
            .ok_or(RelayError::RecordBody { index })?;
        let envelope = Envelope::from_wire(body).map_err(|source| RelayError::Envelope {
            message_id: message_id.clone(),
            source,
        })?;
        decoded.push(QueueRecord {
            message_id,
            envelope,
        });
    }

    Ok(decoded)
}

/// Detail republished for one record.
///
/// Inline payloads pass through unchanged. Offloaded payloads are inflated
/// only while the resulting entry stays within the bus limit.
pub fn relay_detail(
    envelope: &Envelope,
    payload: Value,
    target: EventTarget<'_>,
) -> Result<Value, serde_json::Error> {
    if !envelope.is_offloaded() {
        return Ok(payload);
    }

    let entry = build_event_entry(&envelope.original_kind, &payload, target)?;
    if estimated_entry_size_kb(&entry) <= EVENT_SIZE_LIMIT_KB {
        return Ok(payload);
    }
    Ok(json!({ "s3Key": envelope.offload_key }))
}

pub async fn handle_queue_event(
    event: &Value,
    config: &RelayConfig,
    reader: &dyn OverflowReader,
    publisher: &dyn EventPublisher,
) -> Result<RelaySummary, RelayError> {
    let started_at = Instant::now();
    let records = decode_queue_records(event)?;
    let target = EventTarget {
        event_bus: &config.event_bus,
        source: &config.event_source,
    };

    let mut records_relayed = 0usize;
    for record in &records {
        if config.disabled {
            tracing::debug!(
                component = "queue_relay",
                event = "record_skipped",
                message_id = record.message_id.as_str(),
            );
            continue;
        }

        let payload = resolve_payload(&record.envelope, reader)
            .await
            .map_err(|source| RelayError::Resolve {
                message_id: record.message_id.clone(),
                source,
            })?;
        let detail =
            relay_detail(&record.envelope, payload, target).map_err(|source| RelayError::Detail {
                message_id: record.message_id.clone(),
                source,
            })?;

        let outcome = publish_event(
            &record.envelope.original_kind,
            &detail,
            false,
            target,
            publisher,
        )
        .await
        .map_err(|source| RelayError::Publish {
            message_id: record.message_id.clone(),
            source,
        })?;

        if let EventOutcome::Published(ack) = outcome {
            records_relayed += 1;
            tracing::debug!(
                component = "queue_relay",
                event = "record_relayed",
                message_id = record.message_id.as_str(),
                detail_type = record.envelope.original_kind.as_str(),
                offloaded = record.envelope.is_offloaded(),
                event_id = ack.event_id.as_deref().unwrap_or_default(),
            );
        }
    }

    tracing::info!(
        component = "queue_relay",
        event = "batch_completed",
        records_received = records.len(),
        records_relayed,
        disabled = config.disabled,
        duration_ms = started_at.elapsed().as_millis() as u64,
    );

    Ok(RelaySummary {
        status: "ok".to_string(),
        records_received: records.len(),
        records_relayed,
        processed_at: Utc::now().to_rfc3339(),
    })
}
