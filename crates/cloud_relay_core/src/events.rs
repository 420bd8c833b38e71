use serde::Serialize;
use thiserror::Error;

use crate::transport::{BoxError, EventAck, EventEntry, EventPublisher};

pub const EVENT_SIZE_LIMIT_KB: u64 = 256;
/// Fixed allowance the bus charges for the entry timestamp.
pub const EVENT_TIME_BYTES: u64 = 14;

#[derive(Debug, Clone, Copy)]
pub struct EventTarget<'a> {
    pub event_bus: &'a str,
    pub source: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Skipped,
    Published(EventAck),
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event detail could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to publish event: {source}")]
    Publish {
        #[source]
        source: BoxError,
    },
    #[error("event bus rejected {failed_entry_count} entry(ies)")]
    Rejected { failed_entry_count: i32 },
}

/// Entry size in kilobytes, rounded to the nearest whole kilobyte.
pub fn estimated_entry_size_kb(entry: &EventEntry) -> u64 {
    let bytes = entry.source.len() as u64
        + entry.detail_type.len() as u64
        + entry.detail.len() as u64
        + EVENT_TIME_BYTES;
    (bytes + 500) / 1000
}

pub fn build_event_entry<T>(
    kind: &str,
    data: &T,
    target: EventTarget<'_>,
) -> Result<EventEntry, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    Ok(EventEntry {
        event_bus: target.event_bus.to_string(),
        source: target.source.to_string(),
        detail_type: kind.to_string(),
        detail: serde_json::to_string(data)?,
    })
}

pub async fn publish_event<T>(
    kind: &str,
    data: &T,
    disabled: bool,
    target: EventTarget<'_>,
    publisher: &dyn EventPublisher,
) -> Result<EventOutcome, EventError>
where
    T: Serialize + ?Sized,
{
    if disabled {
        return Ok(EventOutcome::Skipped);
    }

    let entry = build_event_entry(kind, data, target)?;
    let size_kb = estimated_entry_size_kb(&entry);
    if size_kb > EVENT_SIZE_LIMIT_KB {
        // The bus rejects the entry itself; the warning names the offender.
        tracing::warn!(
            component = "event_publish",
            event = "entry_over_limit",
            detail_type = kind,
            size_kb,
            limit_kb = EVENT_SIZE_LIMIT_KB,
        );
    }

    let ack = publisher
        .put_event(entry)
        .await
        .map_err(|source| EventError::Publish { source })?;
    if ack.failed_entry_count > 0 {
        return Err(EventError::Rejected {
            failed_entry_count: ack.failed_entry_count,
        });
    }

    Ok(EventOutcome::Published(ack))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::test_support::CapturingPublisher;

    use super::*;

    const TARGET: EventTarget<'static> = EventTarget {
        event_bus: "entries-bus",
        source: "entries.api",
    };

    #[test]
    fn estimates_entry_size_from_all_text_fields() {
        let entry = EventEntry {
            event_bus: "ignored-bus-name".to_string(),
            source: "s".repeat(100),
            detail_type: "t".repeat(100),
            detail: "d".repeat(1_286),
        };

        assert_eq!(estimated_entry_size_kb(&entry), 2);
    }

    #[test]
    fn size_estimate_rounds_half_up() {
        let entry = EventEntry {
            event_bus: String::new(),
            source: String::new(),
            detail_type: String::new(),
            detail: "d".repeat(486),
        };

        assert_eq!(estimated_entry_size_kb(&entry), 1);
    }

    #[tokio::test]
    async fn publishes_detail_as_json() {
        let publisher = CapturingPublisher::new();

        let outcome = publish_event(
            "entry-submitted",
            &json!({"passportNo": "CLE-1"}),
            false,
            TARGET,
            &publisher,
        )
        .await
        .expect("publish should succeed");

        assert!(matches!(outcome, EventOutcome::Published(_)));
        let entries = publisher.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].detail_type, "entry-submitted");
        assert_eq!(entries[0].event_bus, "entries-bus");
        assert_eq!(entries[0].detail, r#"{"passportNo":"CLE-1"}"#);
    }

    #[tokio::test]
    async fn disabled_publish_does_not_reach_the_bus() {
        let publisher = CapturingPublisher::new();

        let outcome = publish_event("kind", &json!({}), true, TARGET, &publisher)
            .await
            .expect("disabled publish should succeed");

        assert_eq!(outcome, EventOutcome::Skipped);
        assert!(publisher.entries().is_empty());
    }

    #[tokio::test]
    async fn failed_entries_are_reported() {
        let publisher = CapturingPublisher::rejecting();

        let error = publish_event("kind", &json!({}), false, TARGET, &publisher)
            .await
            .expect_err("rejected entry should fail");

        assert!(matches!(
            error,
            EventError::Rejected {
                failed_entry_count: 1
            }
        ));
    }
}
