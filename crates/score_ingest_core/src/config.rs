//! Deployment configuration.
//!
//! Every deployment-specific value (table, topic, notification region and
//! sender, header aliases, retry and deadline tuning) comes from the
//! environment. [`IngestionConfig::from_lookup`] takes the lookup as a closure
//! so tests can feed a map instead of mutating process state.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::budget::DEFAULT_DEADLINE_RESERVE;
use crate::columns::{ColumnAliases, ColumnRole};
use crate::item::{EMAIL_ATTRIBUTE, NAME_ATTRIBUTE, PERCENTAGE_ATTRIBUTE, PROCESSED_AT_ATTRIBUTE};
use crate::notification::DEFAULT_SUBJECT;
use crate::retry::RetryPolicy;

pub const TABLE_NAME_VAR: &str = "STUDENT_TABLE_NAME";
pub const TOPIC_VAR: &str = "NOTIFICATION_TOPIC_ARN";
pub const REGION_VAR: &str = "NOTIFICATION_REGION";
pub const SENDER_VAR: &str = "NOTIFICATION_SENDER";
pub const SUBJECT_VAR: &str = "NOTIFICATION_SUBJECT";
pub const KEY_ATTRIBUTE_VAR: &str = "TABLE_KEY_ATTRIBUTE";
pub const RETRY_MAX_ATTEMPTS_VAR: &str = "RETRY_MAX_ATTEMPTS";
pub const RETRY_BASE_DELAY_MS_VAR: &str = "RETRY_BASE_DELAY_MS";
pub const RETRY_MAX_DELAY_MS_VAR: &str = "RETRY_MAX_DELAY_MS";
pub const DEADLINE_RESERVE_MS_VAR: &str = "DEADLINE_RESERVE_MS";

pub const DEFAULT_KEY_ATTRIBUTE: &str = "student_id";

const RESERVED_ATTRIBUTES: [&str; 7] = [
    NAME_ATTRIBUTE,
    PERCENTAGE_ATTRIBUTE,
    EMAIL_ATTRIBUTE,
    PROCESSED_AT_ATTRIBUTE,
    "day",
    "month",
    "time",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
    #[error("{var}='{value}' is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationSettings {
    pub topic: String,
    pub subject: String,
    pub region: Option<String>,
    pub sender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionConfig {
    pub table_name: String,
    pub key_attribute: String,
    pub notification: NotificationSettings,
    pub column_aliases: ColumnAliases,
    pub retry: RetryPolicy,
    pub deadline_reserve: Duration,
}

impl IngestionConfig {
    /// Configuration with defaults for everything but the two required values.
    pub fn new(table_name: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            key_attribute: DEFAULT_KEY_ATTRIBUTE.to_string(),
            notification: NotificationSettings {
                topic: topic.into(),
                subject: DEFAULT_SUBJECT.to_string(),
                region: None,
                sender: None,
            },
            column_aliases: ColumnAliases::default(),
            retry: RetryPolicy::default(),
            deadline_reserve: DEFAULT_DEADLINE_RESERVE,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let required = |name: &'static str| read(name).ok_or(ConfigError::Missing(name));

        let mut config = Self::new(required(TABLE_NAME_VAR)?, required(TOPIC_VAR)?);

        if let Some(subject) = read(SUBJECT_VAR) {
            config.notification.subject = subject;
        }
        config.notification.region = read(REGION_VAR);
        config.notification.sender = read(SENDER_VAR);

        if let Some(key_attribute) = read(KEY_ATTRIBUTE_VAR) {
            if RESERVED_ATTRIBUTES.contains(&key_attribute.as_str()) {
                return Err(ConfigError::Invalid {
                    var: KEY_ATTRIBUTE_VAR,
                    value: key_attribute,
                    reason: "collides with a stored record attribute".to_string(),
                });
            }
            config.key_attribute = key_attribute;
        }

        for role in ColumnRole::ALL {
            if let Some(extra) = read(alias_var(role)) {
                config.column_aliases = config
                    .column_aliases
                    .with_extra(role, extra.split(',').map(str::trim));
            }
        }

        if let Some(value) = read(RETRY_MAX_ATTEMPTS_VAR) {
            config.retry.max_attempts = parse_var(RETRY_MAX_ATTEMPTS_VAR, &value)?;
        }
        if let Some(value) = read(RETRY_BASE_DELAY_MS_VAR) {
            config.retry.base_delay =
                Duration::from_millis(parse_var(RETRY_BASE_DELAY_MS_VAR, &value)?);
        }
        if let Some(value) = read(RETRY_MAX_DELAY_MS_VAR) {
            config.retry.max_delay =
                Duration::from_millis(parse_var(RETRY_MAX_DELAY_MS_VAR, &value)?);
        }
        if let Some(value) = read(DEADLINE_RESERVE_MS_VAR) {
            config.deadline_reserve =
                Duration::from_millis(parse_var(DEADLINE_RESERVE_MS_VAR, &value)?);
        }

        Ok(config)
    }
}

pub fn alias_var(role: ColumnRole) -> &'static str {
    match role {
        ColumnRole::Id => "COLUMN_ALIASES_ID",
        ColumnRole::Name => "COLUMN_ALIASES_NAME",
        ColumnRole::Percentage => "COLUMN_ALIASES_PERCENTAGE",
        ColumnRole::Email => "COLUMN_ALIASES_EMAIL",
    }
}

fn parse_var<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|error: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: error.to_string(),
    })
}
