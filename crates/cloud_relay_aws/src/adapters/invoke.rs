use aws_config::SdkConfig;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::LogType;
use cloud_relay_core::invoke::{decode_invocation_result, invocation_payload, InvocationResult};
use serde::Serialize;

use crate::error::AwsError;

#[derive(Debug, Clone)]
pub struct FunctionInvoker {
    client: aws_sdk_lambda::Client,
}

impl FunctionInvoker {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self::from_client(aws_sdk_lambda::Client::new(sdk_config))
    }

    pub fn from_client(client: aws_sdk_lambda::Client) -> Self {
        Self { client }
    }

    /// Synchronous invoke with the log tail attached to the result.
    pub async fn invoke<T>(&self, function_name: &str, payload: &T) -> Result<InvocationResult, AwsError>
    where
        T: Serialize + ?Sized,
    {
        let request_payload = invocation_payload(payload)?;
        let output = self
            .client
            .invoke()
            .function_name(function_name)
            .payload(Blob::new(request_payload))
            .log_type(LogType::Tail)
            .send()
            .await
            .map_err(aws_sdk_lambda::Error::from)?;

        let result = decode_invocation_result(
            output.status_code(),
            output.payload().map(|blob| blob.as_ref()),
            output.log_result(),
            output.function_error(),
        )?;
        if let Some(function_error) = &result.function_error {
            tracing::warn!(
                component = "function_invoke",
                event = "function_error",
                function_name,
                function_error = function_error.as_str(),
            );
        }
        Ok(result)
    }
}
