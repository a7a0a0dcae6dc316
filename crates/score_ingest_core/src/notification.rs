use serde_json::json;

use crate::contract::StudentRecord;

pub const DEFAULT_SUBJECT: &str = "Performance Report";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Renders the per-student message. Whole-number scores are printed without a
/// fractional part (`88%`, not `88.0%`).
pub fn render_notification(
    record: &StudentRecord,
    subject: &str,
    sender: Option<&str>,
) -> Notification {
    let mut body = format!(
        "Hello {name},\n\n\
         We have processed your performance. Here are your performance details:\n\n\
         Percentage: {percentage}%\n\n\
         If you have any questions or need further assistance, please let us know.\n\n\
         Best regards,\n\
         Your Team",
        name = record.name,
        percentage = format_percentage(record.percentage),
    );
    if let Some(sender) = sender {
        body.push_str(&format!("\n{sender}"));
    }

    Notification {
        subject: subject.to_string(),
        body,
    }
}

pub fn format_percentage(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Message envelope with per-protocol variants. Email subscribers and every
/// other protocol receive the same text.
pub fn message_envelope(body: &str) -> String {
    json!({
        "default": body,
        "email": body,
    })
    .to_string()
}
