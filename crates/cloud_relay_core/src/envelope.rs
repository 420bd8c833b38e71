use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Record placed on the queue.
///
/// An envelope either carries its payload inline (`offload_key` empty) or
/// points at an overflow object (`payload` is `{}`). Field names on the wire
/// stay compatible with existing queue consumers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub payload: Value,
    #[serde(rename = "s3Key", default)]
    pub offload_key: String,
    #[serde(rename = "originalDetailType")]
    pub original_kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeShapeError {
    message: String,
}

impl EnvelopeShapeError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for EnvelopeShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EnvelopeShapeError {}

impl Envelope {
    pub fn inline(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            payload,
            offload_key: String::new(),
            original_kind: kind.into(),
        }
    }

    pub fn offloaded(kind: impl Into<String>, offload_key: impl Into<String>) -> Self {
        Self {
            payload: Value::Object(Map::new()),
            offload_key: offload_key.into(),
            original_kind: kind.into(),
        }
    }

    pub fn is_offloaded(&self) -> bool {
        !self.offload_key.is_empty()
    }

    /// Checks the carrier invariant on envelopes read back from the wire.
    ///
    /// An inline envelope with an empty payload is valid: an empty body is
    /// sent as-is and never offloaded.
    pub fn validate(&self) -> Result<(), EnvelopeShapeError> {
        if !self.is_offloaded() {
            return Ok(());
        }

        let payload_is_empty = match &self.payload {
            Value::Object(map) => map.is_empty(),
            Value::Null => true,
            _ => false,
        };
        if !payload_is_empty {
            return Err(EnvelopeShapeError::new(
                "offloaded envelope must not carry an inline payload",
            ));
        }

        Ok(())
    }

    pub fn to_wire(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_wire(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }
}
