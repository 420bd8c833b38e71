use aws_config::SdkConfig;
use aws_sdk_ssm::types::ParameterType;

use crate::error::AwsError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub value: String,
    pub version: i64,
}

#[derive(Debug, Clone)]
pub struct ParameterStore {
    client: aws_sdk_ssm::Client,
}

impl ParameterStore {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self::from_client(aws_sdk_ssm::Client::new(sdk_config))
    }

    pub fn from_client(client: aws_sdk_ssm::Client) -> Self {
        Self { client }
    }

    /// `None` when the store reports the name as invalid or unknown.
    pub async fn get_parameter(&self, name: &str) -> Result<Option<Parameter>, AwsError> {
        let output = self
            .client
            .get_parameters()
            .names(name)
            .send()
            .await
            .map_err(aws_sdk_ssm::Error::from)?;

        Ok(output
            .parameters()
            .iter()
            .find(|parameter| parameter.name() == Some(name))
            .map(|parameter| Parameter {
                name: name.to_string(),
                value: parameter.value().unwrap_or_default().to_string(),
                version: parameter.version(),
            }))
    }

    /// Writes a plain string parameter, replacing any existing value.
    /// Returns the new version.
    pub async fn put_parameter(&self, name: &str, value: &str) -> Result<i64, AwsError> {
        let output = self
            .client
            .put_parameter()
            .name(name)
            .value(value)
            .overwrite(true)
            .r#type(ParameterType::String)
            .send()
            .await
            .map_err(aws_sdk_ssm::Error::from)?;

        Ok(output.version())
    }
}
