use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

pub const RESULT_SCHEMA_VERSION: &str = "v1";
pub const COMPLETION_MESSAGE: &str = "File processed and notifications sent successfully";
pub const SUCCESS_STATUS_CODE: u16 = 200;

/// Location of the uploaded file inside the object store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceObject {
    pub container: String,
    pub key: String,
}

impl SourceObject {
    pub fn new(container: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
        }
    }
}

/// One validated CSV row. Lives only for the duration of its write+notify step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentRecord {
    pub student_id: String,
    pub name: String,
    pub percentage: f64,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

impl StudentRecord {
    pub fn captured_at(mut self, at: DateTime<Utc>) -> Self {
        self.captured_at = Some(at);
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FailureReason {
    InvalidRecord,
    PersistenceError,
    NotificationError,
    Deadline,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRecord => "InvalidRecord",
            Self::PersistenceError => "PersistenceError",
            Self::NotificationError => "NotificationError",
            Self::Deadline => "Deadline",
        }
    }
}

/// A row-level failure. `row` is the 1-based data row index (the header is
/// not counted).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowFailure {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    pub reason: FailureReason,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestionResult {
    pub schema_version: String,
    pub source: SourceObject,
    pub source_sha256: String,
    pub total_rows: usize,
    pub persisted: usize,
    pub notified: usize,
    pub failures: Vec<RowFailure>,
}

impl IngestionResult {
    pub fn new(source: SourceObject, source_sha256: String) -> Self {
        Self {
            schema_version: RESULT_SCHEMA_VERSION.to_string(),
            source,
            source_sha256,
            total_rows: 0,
            persisted: 0,
            notified: 0,
            failures: Vec::new(),
        }
    }

    pub fn record_failure(
        &mut self,
        row: usize,
        student_id: Option<String>,
        reason: FailureReason,
        message: impl Into<String>,
    ) {
        self.failures.push(RowFailure {
            row,
            student_id,
            reason,
            message: message.into(),
        });
    }

    pub fn failure_count(&self, reason: FailureReason) -> usize {
        self.failures
            .iter()
            .filter(|failure| failure.reason == reason)
            .count()
    }

    pub fn completion_message(&self) -> String {
        if self.failures.is_empty() {
            COMPLETION_MESSAGE.to_string()
        } else {
            format!("File processed with {} row failure(s)", self.failures.len())
        }
    }
}

/// Summary returned to the hosting platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

pub fn completion_response(
    result: &IngestionResult,
) -> Result<InvocationResponse, serde_json::Error> {
    let body = json!({
        "message": result.completion_message(),
        "result": serde_json::to_value(result)?,
    });

    Ok(InvocationResponse {
        status_code: SUCCESS_STATUS_CODE,
        body: body.to_string(),
    })
}

pub fn source_fingerprint(contents: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    format!("{:x}", hasher.finalize())
}

pub fn parse_response_body(response: &InvocationResponse) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&response.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> IngestionResult {
        IngestionResult::new(
            SourceObject::new("uploads", "scores.csv"),
            source_fingerprint(b"id,name,percentage,email\n"),
        )
    }

    #[test]
    fn failure_reasons_serialize_as_kind_names() {
        let encoded = serde_json::to_value(FailureReason::InvalidRecord).expect("serializes");
        assert_eq!(encoded, Value::from("InvalidRecord"));
        assert_eq!(FailureReason::Deadline.as_str(), "Deadline");
    }

    #[test]
    fn completion_message_reflects_row_failures() {
        let mut result = sample_result();
        assert_eq!(result.completion_message(), COMPLETION_MESSAGE);

        result.record_failure(2, Some("1002".to_string()), FailureReason::InvalidRecord, "x");
        assert_eq!(
            result.completion_message(),
            "File processed with 1 row failure(s)"
        );
        assert_eq!(result.failure_count(FailureReason::InvalidRecord), 1);
        assert_eq!(result.failure_count(FailureReason::Deadline), 0);
    }

    #[test]
    fn completion_response_wraps_result_in_json_body() {
        let mut result = sample_result();
        result.total_rows = 1;
        result.persisted = 1;
        result.notified = 1;

        let response = completion_response(&result).expect("response should serialize");
        assert_eq!(response.status_code, 200);

        let body = parse_response_body(&response).expect("body should be json");
        assert_eq!(body["message"], Value::from(COMPLETION_MESSAGE));
        assert_eq!(body["result"]["persisted"], Value::from(1));
        assert_eq!(body["result"]["source"]["key"], Value::from("scores.csv"));

        let envelope = serde_json::to_value(&response).expect("envelope serializes");
        assert_eq!(envelope["statusCode"], Value::from(200));
    }

    #[test]
    fn fingerprint_is_stable_hex_sha256() {
        let first = source_fingerprint(b"abc");
        assert_eq!(
            first,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(first, source_fingerprint(b"abc"));
    }

    #[test]
    fn row_failure_omits_unknown_identifier() {
        let failure = RowFailure {
            row: 3,
            student_id: None,
            reason: FailureReason::InvalidRecord,
            message: "unreadable row".to_string(),
        };
        let json = serde_json::to_string(&failure).expect("serializes");
        assert!(!json.contains("student_id"));
    }
}
