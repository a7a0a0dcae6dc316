use percent_encoding::percent_decode_str;
use serde_json::Value;

use crate::runtime::contract::SourceObject;
use crate::runtime::error::IngestError;

/// Extracts the uploaded object from a trigger event.
///
/// Two shapes are accepted:
/// - an object-store notification (`Records[0].s3.bucket.name` and
///   `Records[0].s3.object.key`), whose key is URL-encoded with `+` for spaces;
/// - a direct replay payload `{"container": ..., "key": ...}` (`bucket` is
///   accepted for `container`), whose key is used verbatim.
///
/// Only the first notification record is processed.
pub fn source_from_event(event: &Value) -> Result<SourceObject, IngestError> {
    let Some(object) = event.as_object() else {
        return Err(IngestError::malformed("trigger event must be a JSON object"));
    };

    if let Some(records) = object.get("Records") {
        return source_from_records(records);
    }

    let container = object
        .get("container")
        .or_else(|| object.get("bucket"))
        .and_then(Value::as_str);
    let key = object.get("key").and_then(Value::as_str);
    match (container, key) {
        (Some(container), Some(key)) => non_empty_source(container, key.to_string()),
        _ => Err(IngestError::malformed(
            "trigger event must include Records or container and key",
        )),
    }
}

fn source_from_records(records: &Value) -> Result<SourceObject, IngestError> {
    let records = records
        .as_array()
        .ok_or_else(|| IngestError::malformed("trigger Records must be an array"))?;
    let first = records
        .first()
        .ok_or_else(|| IngestError::malformed("trigger Records array is empty"))?;

    if records.len() > 1 {
        tracing::warn!(
            component = "trigger",
            event = "extra_records_ignored",
            record_count = records.len(),
        );
    }

    let container = first
        .pointer("/s3/bucket/name")
        .and_then(Value::as_str)
        .ok_or_else(|| IngestError::malformed("trigger record is missing s3.bucket.name"))?;
    let encoded_key = first
        .pointer("/s3/object/key")
        .and_then(Value::as_str)
        .ok_or_else(|| IngestError::malformed("trigger record is missing s3.object.key"))?;

    non_empty_source(container, decode_object_key(encoded_key)?)
}

fn non_empty_source(container: &str, key: String) -> Result<SourceObject, IngestError> {
    if container.trim().is_empty() || key.trim().is_empty() {
        return Err(IngestError::malformed(
            "trigger container and key must be non-empty",
        ));
    }
    Ok(SourceObject::new(container, key))
}

pub fn decode_object_key(encoded: &str) -> Result<String, IngestError> {
    let spaced = encoded.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|error| {
            IngestError::malformed(format!("object key '{encoded}' is not valid UTF-8: {error}"))
        })
}
