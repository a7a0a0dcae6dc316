use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_sns::config::Region;
use chrono::Utc;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use score_ingest_core::budget::RunBudget;
use score_ingest_core::config::IngestionConfig;
use score_ingest_core::contract::{completion_response, InvocationResponse};
use score_ingest_lambda::adapters::aws::{DynamoRecordStore, S3ObjectSource, SnsNotifier};
use score_ingest_lambda::adapters::clock::{Clock, SystemClock};
use score_ingest_lambda::handlers::ingest::{handle_trigger_event, Collaborators};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

struct RuntimeDependencies {
    config: IngestionConfig,
    objects: S3ObjectSource,
    records: DynamoRecordStore,
    notifier: SnsNotifier,
    clock: SystemClock,
}

async fn handle_request(
    event: LambdaEvent<Value>,
    deps: &RuntimeDependencies,
) -> Result<InvocationResponse, Error> {
    let now_epoch_ms = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let budget = RunBudget::from_epoch_deadline_ms(
        event.context.deadline,
        now_epoch_ms,
        deps.clock.instant(),
        deps.config.deadline_reserve,
    );
    let collaborators = Collaborators {
        objects: &deps.objects,
        records: &deps.records,
        notifier: &deps.notifier,
        clock: &deps.clock,
    };

    let result = handle_trigger_event(&event.payload, &deps.config, &budget, collaborators)
        .map_err(|error| Error::from(format!("{}: {error}", error.kind())))?;

    completion_response(&result)
        .map_err(|error| Error::from(format!("failed to encode invocation response: {error}")))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_current_span(false)
        .init();

    let config = IngestionConfig::from_env()?;

    // The core retry policy is the only retry layer.
    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::disabled())
        .load()
        .await;

    let mut sns_config = aws_sdk_sns::config::Builder::from(&aws_config);
    if let Some(region) = &config.notification.region {
        sns_config = sns_config.region(Region::new(region.clone()));
    }

    let deps = RuntimeDependencies {
        objects: S3ObjectSource::new(aws_sdk_s3::Client::new(&aws_config)),
        records: DynamoRecordStore::new(aws_sdk_dynamodb::Client::new(&aws_config)),
        notifier: SnsNotifier::new(aws_sdk_sns::Client::from_conf(sns_config.build())),
        clock: SystemClock,
        config,
    };

    lambda_runtime::run(service_fn(|event| handle_request(event, &deps))).await
}
