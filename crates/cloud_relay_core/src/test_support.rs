//! In-memory collaborators that record every call.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::transport::{
    BoxError, EventAck, EventEntry, EventPublisher, OutboundMessage, OverflowReader,
    OverflowStore, QueueTransport, SendAck,
};

#[derive(Default)]
pub struct CapturingStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    writes: Mutex<Vec<(String, Vec<u8>)>>,
    reads: Mutex<Vec<String>>,
    failure: Option<String>,
}

impl CapturingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `key` readable without recording a write.
    pub fn seed(&self, key: &str, body: Vec<u8>) {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string(), body);
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn writes(&self) -> Vec<(String, Vec<u8>)> {
        self.writes.lock().expect("poisoned mutex").clone()
    }

    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl OverflowStore for CapturingStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), BoxError> {
        if let Some(message) = &self.failure {
            return Err(message.clone().into());
        }
        self.writes
            .lock()
            .expect("poisoned mutex")
            .push((key.to_string(), body.clone()));
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string(), body);
        Ok(())
    }
}

#[async_trait]
impl OverflowReader for CapturingStore {
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, BoxError> {
        self.reads
            .lock()
            .expect("poisoned mutex")
            .push(key.to_string());
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(key)
            .cloned()
            .ok_or_else(|| format!("no such key: {key}").into())
    }
}

#[derive(Default)]
pub struct CapturingTransport {
    messages: Mutex<Vec<OutboundMessage>>,
    failure: Option<String>,
}

impl CapturingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.messages.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl QueueTransport for CapturingTransport {
    async fn send(&self, message: OutboundMessage) -> Result<SendAck, BoxError> {
        if let Some(error) = &self.failure {
            return Err(error.clone().into());
        }
        let mut messages = self.messages.lock().expect("poisoned mutex");
        messages.push(message);
        Ok(SendAck {
            message_id: format!("message-{}", messages.len()),
            sequence_number: None,
        })
    }
}

#[derive(Default)]
pub struct CapturingPublisher {
    entries: Mutex<Vec<EventEntry>>,
    failed_entry_count: i32,
}

impl CapturingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting() -> Self {
        Self {
            failed_entry_count: 1,
            ..Self::new()
        }
    }

    pub fn entries(&self) -> Vec<EventEntry> {
        self.entries.lock().expect("poisoned mutex").clone()
    }
}

#[async_trait]
impl EventPublisher for CapturingPublisher {
    async fn put_event(&self, entry: EventEntry) -> Result<EventAck, BoxError> {
        let mut entries = self.entries.lock().expect("poisoned mutex");
        entries.push(entry);
        Ok(EventAck {
            event_id: (self.failed_entry_count == 0).then(|| format!("event-{}", entries.len())),
            failed_entry_count: self.failed_entry_count,
        })
    }
}
