use std::collections::HashSet;

use validator::ValidateEmail;

use crate::contract::StudentRecord;
use crate::rows::RawRow;

pub const MIN_PERCENTAGE: f64 = 0.0;
pub const MAX_PERCENTAGE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecord {
    /// Identifier as read from the row, when there was one.
    pub student_id: Option<String>,
    pub message: String,
}

impl InvalidRecord {
    fn new(raw: &RawRow, message: impl Into<String>) -> Self {
        Self {
            student_id: (!raw.id.is_empty()).then(|| raw.id.clone()),
            message: message.into(),
        }
    }
}

/// Turns raw rows into [`StudentRecord`]s. Remembers the identifiers already
/// stored from the current file (see [`RecordValidator::mark_stored`]), so a
/// single validator must be used per file.
#[derive(Debug, Default)]
pub struct RecordValidator {
    stored_ids: HashSet<String>,
}

impl RecordValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once a record's write succeeded; later rows with the same
    /// identifier are then rejected.
    pub fn mark_stored(&mut self, student_id: &str) {
        self.stored_ids.insert(student_id.to_string());
    }

    pub fn validate(&self, raw: RawRow) -> Result<StudentRecord, InvalidRecord> {
        let empty: Vec<&str> = [
            ("id", &raw.id),
            ("name", &raw.name),
            ("percentage", &raw.percentage),
            ("email", &raw.email),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();
        if !empty.is_empty() {
            return Err(InvalidRecord::new(
                &raw,
                format!("required field(s) empty: {}", empty.join(", ")),
            ));
        }

        let percentage = parse_percentage(&raw.percentage)
            .map_err(|message| InvalidRecord::new(&raw, message))?;

        if !raw.email.validate_email() {
            return Err(InvalidRecord::new(
                &raw,
                format!("'{}' is not a valid email address", raw.email),
            ));
        }

        if self.stored_ids.contains(&raw.id) {
            return Err(InvalidRecord::new(
                &raw,
                format!(
                    "student identifier '{}' was already stored from an earlier row",
                    raw.id
                ),
            ));
        }

        Ok(StudentRecord {
            student_id: raw.id,
            name: raw.name,
            percentage,
            email: raw.email,
            captured_at: None,
        })
    }
}

/// Accepts plain numbers and an optional trailing `%`.
pub fn parse_percentage(raw: &str) -> Result<f64, String> {
    let trimmed = raw.trim();
    let numeric = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    let value: f64 = numeric
        .parse()
        .map_err(|_| format!("percentage '{raw}' is not a number"))?;

    if !value.is_finite() || !(MIN_PERCENTAGE..=MAX_PERCENTAGE).contains(&value) {
        return Err(format!("percentage {value} is outside {MIN_PERCENTAGE}-{MAX_PERCENTAGE}"));
    }
    Ok(value)
}
