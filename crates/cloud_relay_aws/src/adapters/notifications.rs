use aws_config::SdkConfig;
use aws_sdk_sns::types::MessageAttributeValue;
use serde::Serialize;

use crate::error::AwsError;

pub const SMS_SENDER_ID_ATTRIBUTE: &str = "AWS.SNS.SMS.SenderID";

#[derive(Debug, Clone)]
pub struct Notifier {
    client: aws_sdk_sns::Client,
}

impl Notifier {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self::from_client(aws_sdk_sns::Client::new(sdk_config))
    }

    pub fn from_client(client: aws_sdk_sns::Client) -> Self {
        Self { client }
    }

    /// Publishes `data` as a JSON message; returns the message id.
    pub async fn publish_to_topic<T>(&self, topic_arn: &str, data: &T) -> Result<String, AwsError>
    where
        T: Serialize + ?Sized,
    {
        let output = self
            .client
            .publish()
            .topic_arn(topic_arn)
            .message(serde_json::to_string(data)?)
            .send()
            .await
            .map_err(aws_sdk_sns::Error::from)?;

        message_id(output.message_id())
    }

    pub async fn send_sms(
        &self,
        phone_number: &str,
        sender_id: &str,
        body: &str,
    ) -> Result<String, AwsError> {
        let output = self
            .client
            .publish()
            .phone_number(phone_number)
            .message(body)
            .message_attributes(SMS_SENDER_ID_ATTRIBUTE, sender_id_attribute(sender_id)?)
            .send()
            .await
            .map_err(aws_sdk_sns::Error::from)?;

        message_id(output.message_id())
    }
}

fn sender_id_attribute(sender_id: &str) -> Result<MessageAttributeValue, AwsError> {
    Ok(MessageAttributeValue::builder()
        .data_type("String")
        .string_value(sender_id)
        .build()?)
}

fn message_id(value: Option<&str>) -> Result<String, AwsError> {
    value.map(str::to_string).ok_or(AwsError::MissingField {
        operation: "Publish",
        field: "MessageId",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sender_id_is_a_string_attribute() {
        let attribute = sender_id_attribute("CLEARANCE").expect("attribute should build");

        assert_eq!(attribute.data_type(), "String");
        assert_eq!(attribute.string_value(), Some("CLEARANCE"));
    }

    #[test]
    fn missing_message_id_is_an_error() {
        let error = message_id(None).expect_err("missing id should fail");
        assert_eq!(error.to_string(), "Publish response is missing MessageId");
    }
}
