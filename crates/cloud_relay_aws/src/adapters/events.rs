use std::time::SystemTime;

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_eventbridge::primitives::DateTime;
use aws_sdk_eventbridge::types::PutEventsRequestEntry;
use cloud_relay_core::transport::{BoxError, EventAck, EventEntry, EventPublisher};

#[derive(Debug, Clone)]
pub struct EventBridgePublisher {
    client: aws_sdk_eventbridge::Client,
}

impl EventBridgePublisher {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self::from_client(aws_sdk_eventbridge::Client::new(sdk_config))
    }

    pub fn from_client(client: aws_sdk_eventbridge::Client) -> Self {
        Self { client }
    }
}

fn request_entry(entry: EventEntry, time: SystemTime) -> PutEventsRequestEntry {
    PutEventsRequestEntry::builder()
        .detail(entry.detail)
        .detail_type(entry.detail_type)
        .event_bus_name(entry.event_bus)
        .source(entry.source)
        .time(DateTime::from(time))
        .build()
}

#[async_trait]
impl EventPublisher for EventBridgePublisher {
    async fn put_event(&self, entry: EventEntry) -> Result<EventAck, BoxError> {
        let output = self
            .client
            .put_events()
            .entries(request_entry(entry, SystemTime::now()))
            .send()
            .await
            .map_err(aws_sdk_eventbridge::Error::from)?;

        let first = output.entries().first();
        if let Some(code) = first.and_then(|result| result.error_code()) {
            tracing::warn!(
                component = "event_publish",
                event = "entry_rejected",
                error_code = code,
                error_message = first
                    .and_then(|result| result.error_message())
                    .unwrap_or_default(),
            );
        }

        Ok(EventAck {
            event_id: first
                .and_then(|result| result.event_id())
                .map(str::to_string),
            failed_entry_count: output.failed_entry_count(),
        })
    }
}
