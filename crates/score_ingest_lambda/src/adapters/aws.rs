//! AWS SDK implementations of the collaborator traits.
//!
//! The handler is synchronous, so each adapter blocks on the SDK future with
//! `block_in_place`; the Lambda binary therefore runs on the multi-threaded
//! Tokio runtime. SDK-level retries are disabled in the binary and the core
//! retry policy decides, using the classification below.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue as DynamoAttributeValue;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

use crate::adapters::notifier::Notifier;
use crate::adapters::object_store::ObjectSource;
use crate::adapters::record_store::RecordStore;
use crate::runtime::error::CollaboratorError;
use crate::runtime::item::{AttributeValue, ItemAttributes};
use crate::runtime::notification::message_envelope;

const RETRYABLE_ERROR_CODES: [&str; 10] = [
    "InternalError",
    "InternalFailure",
    "InternalServerError",
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "RequestTimeout",
    "ServiceUnavailable",
    "SlowDown",
    "Throttling",
    "ThrottlingException",
];

pub fn is_retryable_error_code(code: &str) -> bool {
    RETRYABLE_ERROR_CODES.contains(&code)
}

fn is_retryable<E, R>(error: &SdkError<E, R>) -> bool
where
    E: ProvideErrorMetadata,
{
    match error {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        SdkError::ServiceError(context) => context
            .err()
            .code()
            .map(is_retryable_error_code)
            .unwrap_or(false),
        _ => false,
    }
}

fn collaborator_error<E, R>(context: &str, error: SdkError<E, R>) -> CollaboratorError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    CollaboratorError {
        retryable: is_retryable(&error),
        message: format!("{context}: {}", DisplayErrorContext(&error)),
    }
}

pub struct S3ObjectSource {
    s3_client: aws_sdk_s3::Client,
}

impl S3ObjectSource {
    pub fn new(s3_client: aws_sdk_s3::Client) -> Self {
        Self { s3_client }
    }
}

async fn fetch_object(
    client: aws_sdk_s3::Client,
    bucket: String,
    object_key: String,
) -> Result<Vec<u8>, CollaboratorError> {
    let output = client
        .get_object()
        .bucket(bucket)
        .key(object_key)
        .send()
        .await
        .map_err(|error| collaborator_error("failed to fetch object from s3", error))?;

    output
        .body
        .collect()
        .await
        .map(|data| data.into_bytes().to_vec())
        .map_err(|error| {
            CollaboratorError::transient(format!("failed to read object body from s3: {error}"))
        })
}

impl ObjectSource for S3ObjectSource {
    fn fetch(&self, container: &str, key: &str) -> Result<Vec<u8>, CollaboratorError> {
        let bucket = container.to_string();
        let object_key = key.to_string();
        let client = self.s3_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(fetch_object(client, bucket, object_key))
        })
    }
}

pub struct DynamoRecordStore {
    dynamodb_client: aws_sdk_dynamodb::Client,
}

impl DynamoRecordStore {
    pub fn new(dynamodb_client: aws_sdk_dynamodb::Client) -> Self {
        Self { dynamodb_client }
    }
}

pub fn to_dynamo_item(attributes: &ItemAttributes) -> HashMap<String, DynamoAttributeValue> {
    attributes
        .iter()
        .map(|(name, value)| {
            let converted = match value {
                AttributeValue::Text(text) => DynamoAttributeValue::S(text.clone()),
                AttributeValue::Number(number) => DynamoAttributeValue::N(number.to_string()),
            };
            (name.clone(), converted)
        })
        .collect()
}

impl RecordStore for DynamoRecordStore {
    fn put(
        &self,
        table: &str,
        _key: &str,
        attributes: &ItemAttributes,
    ) -> Result<(), CollaboratorError> {
        let table_name = table.to_string();
        let item = to_dynamo_item(attributes);
        let client = self.dynamodb_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put_item()
                    .table_name(table_name)
                    .set_item(Some(item))
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| collaborator_error("failed to put item to dynamodb", error))
            })
        })
    }
}

pub struct SnsNotifier {
    sns_client: aws_sdk_sns::Client,
}

impl SnsNotifier {
    pub fn new(sns_client: aws_sdk_sns::Client) -> Self {
        Self { sns_client }
    }
}

impl Notifier for SnsNotifier {
    fn publish(&self, topic: &str, subject: &str, body: &str) -> Result<(), CollaboratorError> {
        let topic_arn = topic.to_string();
        let subject = subject.to_string();
        let message = message_envelope(body);
        let client = self.sns_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .publish()
                    .topic_arn(topic_arn)
                    .subject(subject)
                    .message_structure("json")
                    .message(message)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| collaborator_error("failed to publish to sns", error))
            })
        })
    }
}
