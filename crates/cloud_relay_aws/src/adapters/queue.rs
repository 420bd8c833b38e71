use async_trait::async_trait;
use aws_config::SdkConfig;
use cloud_relay_core::transport::{BoxError, OutboundMessage, QueueTransport, SendAck};

use crate::error::AwsError;

/// FIFO queue transport: the partition key is the message group and the
/// dedup token is the deduplication id.
#[derive(Debug, Clone)]
pub struct SqsTransport {
    client: aws_sdk_sqs::Client,
}

impl SqsTransport {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self::from_client(aws_sdk_sqs::Client::new(sdk_config))
    }

    pub fn from_client(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueueTransport for SqsTransport {
    async fn send(&self, message: OutboundMessage) -> Result<SendAck, BoxError> {
        let output = self
            .client
            .send_message()
            .queue_url(message.destination)
            .message_body(message.body)
            .message_group_id(message.partition_key)
            .message_deduplication_id(message.dedup_token)
            .send()
            .await
            .map_err(aws_sdk_sqs::Error::from)?;

        let message_id = output
            .message_id()
            .ok_or(AwsError::MissingField {
                operation: "SendMessage",
                field: "MessageId",
            })?
            .to_string();
        Ok(SendAck {
            message_id,
            sequence_number: output.sequence_number().map(str::to_string),
        })
    }
}
