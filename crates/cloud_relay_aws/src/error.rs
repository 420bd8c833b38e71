use thiserror::Error;

/// Failure of a single pass-through SDK operation.
#[derive(Debug, Error)]
pub enum AwsError {
    #[error("s3 request failed: {0}")]
    S3(#[from] aws_sdk_s3::Error),
    #[error("failed to read s3 object body: {0}")]
    S3Body(#[from] aws_sdk_s3::primitives::ByteStreamError),
    #[error("invalid presigning configuration: {0}")]
    Presigning(#[from] aws_sdk_s3::presigning::PresigningConfigError),
    #[error("sqs request failed: {0}")]
    Sqs(#[from] aws_sdk_sqs::Error),
    #[error("eventbridge request failed: {0}")]
    EventBridge(#[from] aws_sdk_eventbridge::Error),
    #[error("sns request failed: {0}")]
    Sns(#[from] aws_sdk_sns::Error),
    #[error("invalid sns request: {0}")]
    SnsBuild(#[from] aws_sdk_sns::error::BuildError),
    #[error("lambda request failed: {0}")]
    Lambda(#[from] aws_sdk_lambda::Error),
    #[error("ssm request failed: {0}")]
    Ssm(#[from] aws_sdk_ssm::Error),
    #[error("request body could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("document body is not valid base64: {0}")]
    DocumentEncoding(#[from] cloud_relay_core::documents::DocumentDecodeError),
    #[error("function response could not be decoded: {0}")]
    InvocationDecode(#[from] cloud_relay_core::invoke::InvocationDecodeError),
    #[error("object listing failed: {0}")]
    Listing(#[source] cloud_relay_core::transport::BoxError),
    #[error("{operation} response is missing {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}
