use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::contract::StudentRecord;

/// Attribute value in the shape the key-value store understands.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
}

pub type ItemAttributes = BTreeMap<String, AttributeValue>;

pub const NAME_ATTRIBUTE: &str = "name";
pub const PERCENTAGE_ATTRIBUTE: &str = "percentage";
pub const EMAIL_ATTRIBUTE: &str = "email";
pub const PROCESSED_AT_ATTRIBUTE: &str = "processed_at";

/// Builds the stored item for one record. The identifier is stored under
/// `key_attribute`; processing time is stored as an RFC 3339 timestamp plus
/// the `day`, `month` and `time` fields that downstream reports group by.
pub fn build_item(
    record: &StudentRecord,
    key_attribute: &str,
    processed_at: DateTime<Utc>,
) -> ItemAttributes {
    let captured = record.captured_at.unwrap_or(processed_at);
    let text = |value: &str| AttributeValue::Text(value.to_string());

    BTreeMap::from([
        (key_attribute.to_string(), text(&record.student_id)),
        (NAME_ATTRIBUTE.to_string(), text(&record.name)),
        (
            PERCENTAGE_ATTRIBUTE.to_string(),
            AttributeValue::Number(record.percentage),
        ),
        (EMAIL_ATTRIBUTE.to_string(), text(&record.email)),
        (
            PROCESSED_AT_ATTRIBUTE.to_string(),
            AttributeValue::Text(captured.to_rfc3339()),
        ),
        (
            "day".to_string(),
            AttributeValue::Text(captured.format("%d").to_string()),
        ),
        (
            "month".to_string(),
            AttributeValue::Text(captured.format("%B").to_string()),
        ),
        (
            "time".to_string(),
            AttributeValue::Text(captured.format("%H:%M:%S").to_string()),
        ),
    ])
}
