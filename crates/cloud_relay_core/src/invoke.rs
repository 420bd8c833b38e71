use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use thiserror::Error;

/// Function input, wrapped the same way the event bus delivers `detail`.
#[derive(Debug, Serialize)]
pub struct InvocationPayload<'a, T: ?Sized> {
    pub detail: &'a T,
}

pub fn invocation_payload<T>(payload: &T) -> Result<Vec<u8>, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    serde_json::to_vec(&InvocationPayload { detail: payload })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    pub status_code: i32,
    pub payload: String,
    pub logs: String,
    pub function_error: Option<String>,
}

#[derive(Debug, Error)]
pub enum InvocationDecodeError {
    #[error("function response is not valid UTF-8: {0}")]
    Payload(#[from] std::string::FromUtf8Error),
    #[error("function log tail is not valid base64: {0}")]
    LogEncoding(#[from] base64::DecodeError),
}

pub fn decode_invocation_result(
    status_code: i32,
    payload: Option<&[u8]>,
    log_result: Option<&str>,
    function_error: Option<&str>,
) -> Result<InvocationResult, InvocationDecodeError> {
    let payload = String::from_utf8(payload.unwrap_or_default().to_vec())?;
    let logs = match log_result {
        Some(encoded) => String::from_utf8_lossy(&STANDARD.decode(encoded)?).into_owned(),
        None => String::new(),
    };

    Ok(InvocationResult {
        status_code,
        payload,
        logs,
        function_error: function_error.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    #[test]
    fn payload_is_wrapped_in_detail() {
        let bytes = invocation_payload(&json!({"passportNo": "CLE-1"}))
            .expect("payload should serialize");
        let value: Value = serde_json::from_slice(&bytes).expect("payload should be json");

        assert_eq!(value, json!({"detail": {"passportNo": "CLE-1"}}));
    }

    #[test]
    fn decodes_tail_logs() {
        let encoded = STANDARD.encode("START RequestId: 1\nEND RequestId: 1\n");
        let result = decode_invocation_result(200, Some(&br#"{"ok":true}"#[..]), Some(&encoded), None)
            .expect("result should decode");

        assert_eq!(result.payload, r#"{"ok":true}"#);
        assert!(result.logs.starts_with("START RequestId: 1"));
        assert_eq!(result.function_error, None);
    }

    #[test]
    fn missing_payload_and_logs_decode_to_empty_strings() {
        let result = decode_invocation_result(202, None, None, Some("Unhandled"))
            .expect("result should decode");

        assert_eq!(result.payload, "");
        assert_eq!(result.logs, "");
        assert_eq!(result.function_error.as_deref(), Some("Unhandled"));
    }

    #[test]
    fn rejects_malformed_log_tail() {
        let error = decode_invocation_result(200, None, Some("not base64!"), None)
            .expect_err("malformed log tail should fail");

        assert!(matches!(error, InvocationDecodeError::LogEncoding(_)));
    }
}
