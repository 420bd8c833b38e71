use cloud_relay_aws::adapters::events::EventBridgePublisher;
use cloud_relay_aws::adapters::object_store::ObjectStorage;
use cloud_relay_aws::config::RelaySettings;
use cloud_relay_aws::handlers::relay::{handle_queue_event, RelayConfig, RelaySummary};
use lambda_runtime::{service_fn, Error, LambdaEvent};

async fn handle_request(event: LambdaEvent<serde_json::Value>) -> Result<RelaySummary, Error> {
    let settings = RelaySettings::from_env()?;
    let sdk_config = settings.client.load().await;

    let reader = ObjectStorage::new(&sdk_config).bucket(settings.overflow_bucket.as_str());
    let publisher = EventBridgePublisher::new(&sdk_config);
    let config = RelayConfig {
        event_bus: settings.event_bus,
        event_source: settings.event_source,
        disabled: settings.disabled,
    };

    handle_queue_event(&event.payload, &config, &reader, &publisher)
        .await
        .map_err(|error| {
            tracing::error!(
                component = "queue_relay",
                event = "batch_failed",
                request_id = event.context.request_id.as_str(),
                error = %error,
            );
            Error::from(error)
        })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_target(false)
        .without_time()
        .init();

    lambda_runtime::run(service_fn(handle_request)).await
}
