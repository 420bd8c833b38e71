//! Queue and event-bus publishing over AWS.
//!
//! [`QueuePublisher`] binds the offload protocol from `cloud_relay_core` to a
//! FIFO queue and an overflow bucket. [`EventBusPublisher`] does the same for
//! single-entry event publishing.

use aws_config::SdkConfig;
use cloud_relay_core::events::{publish_event, EventError, EventOutcome, EventTarget};
use cloud_relay_core::offload::{
    publish_to_queue, OffloadError, OffloadPolicy, PublishOutcome, QueueMessage,
};
use serde::Serialize;

use crate::adapters::events::EventBridgePublisher;
use crate::adapters::object_store::{BucketStore, ObjectStorage};
use crate::adapters::queue::SqsTransport;

#[derive(Debug, Clone)]
pub struct QueuePublisher {
    transport: SqsTransport,
    overflow: BucketStore,
    policy: OffloadPolicy,
}

impl QueuePublisher {
    pub fn new(sdk_config: &SdkConfig, overflow_bucket: &str, policy: OffloadPolicy) -> Self {
        Self {
            transport: SqsTransport::new(sdk_config),
            overflow: ObjectStorage::new(sdk_config).bucket(overflow_bucket),
            policy,
        }
    }

    pub fn policy(&self) -> &OffloadPolicy {
        &self.policy
    }

    pub async fn publish<T>(
        &self,
        queue_url: &str,
        message_group_id: &str,
        kind: &str,
        body: &T,
    ) -> Result<PublishOutcome, OffloadError>
    where
        T: Serialize + Sync + ?Sized,
    {
        publish_to_queue(
            QueueMessage {
                destination: queue_url,
                group_key: message_group_id,
                kind,
                body,
            },
            &self.policy,
            &self.overflow,
            &self.transport,
        )
        .await
    }
}

#[derive(Debug, Clone)]
pub struct EventBusPublisher {
    publisher: EventBridgePublisher,
    event_bus: String,
    source: String,
    disabled: bool,
}

impl EventBusPublisher {
    pub fn new(
        sdk_config: &SdkConfig,
        event_bus: impl Into<String>,
        source: impl Into<String>,
        disabled: bool,
    ) -> Self {
        Self {
            publisher: EventBridgePublisher::new(sdk_config),
            event_bus: event_bus.into(),
            source: source.into(),
            disabled,
        }
    }

    pub async fn publish<T>(&self, kind: &str, data: &T) -> Result<EventOutcome, EventError>
    where
        T: Serialize + Sync + ?Sized,
    {
        publish_event(
            kind,
            data,
            self.disabled,
            EventTarget {
                event_bus: &self.event_bus,
                source: &self.source,
            },
            &self.publisher,
        )
        .await
    }
}
