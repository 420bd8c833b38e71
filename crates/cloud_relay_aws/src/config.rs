use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use thiserror::Error;

pub const DEFAULT_REGION: &str = "eu-west-2";
const STATIC_PROVIDER_NAME: &str = "cloud-relay-static";

#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .finish()
    }
}

/// Connection settings passed explicitly to every client constructor.
///
/// Without static credentials the SDK default provider chain is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub region: String,
    pub credentials: Option<StaticCredentials>,
    pub endpoint_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            credentials: None,
            endpoint_url: None,
        }
    }
}

impl ClientConfig {
    /// Static keys are only applied when both halves are present.
    pub fn with_keys(secret_access_key: &str, access_key_id: &str) -> Self {
        let credentials = (!secret_access_key.is_empty() && !access_key_id.is_empty()).then(|| {
            StaticCredentials {
                access_key_id: access_key_id.to_string(),
                secret_access_key: secret_access_key.to_string(),
            }
        });
        Self {
            credentials,
            ..Self::default()
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub async fn load(&self) -> SdkConfig {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(self.region.clone()));
        if let Some(credentials) = &self.credentials {
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                None,
                None,
                STATIC_PROVIDER_NAME,
            ));
        }
        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url.clone());
        }
        loader.load().await
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{name} has unsupported value '{value}' (expected true/false/1/0)")]
    InvalidFlag { name: &'static str, value: String },
}

/// Environment of the queue relay Lambda.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub event_bus: String,
    pub event_source: String,
    pub overflow_bucket: String,
    pub disabled: bool,
    pub client: ClientConfig,
}

impl RelaySettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let disabled = match lookup("RELAY_DISABLED") {
            None => false,
            Some(value) => parse_flag("RELAY_DISABLED", &value)?,
        };

        let mut client = ClientConfig::default();
        if let Some(region) = lookup("AWS_REGION").filter(|value| !value.is_empty()) {
            client = client.with_region(region);
        }
        if let Some(endpoint_url) = lookup("RELAY_ENDPOINT_URL").filter(|value| !value.is_empty())
        {
            client = client.with_endpoint_url(endpoint_url);
        }

        Ok(Self {
            event_bus: required("RELAY_EVENT_BUS")?,
            event_source: required("RELAY_EVENT_SOURCE")?,
            overflow_bucket: required("RELAY_OVERFLOW_BUCKET")?,
            disabled,
            client,
        })
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" => Ok(false),
        "1" | "true" => Ok(true),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}
