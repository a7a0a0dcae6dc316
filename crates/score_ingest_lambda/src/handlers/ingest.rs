use serde_json::Value;

use crate::adapters::clock::Clock;
use crate::adapters::notifier::Notifier;
use crate::adapters::object_store::ObjectSource;
use crate::adapters::record_store::RecordStore;
use crate::handlers::trigger::source_from_event;
use crate::runtime::budget::RunBudget;
use crate::runtime::config::IngestionConfig;
use crate::runtime::contract::{source_fingerprint, FailureReason, IngestionResult, SourceObject};
use crate::runtime::error::IngestError;
use crate::runtime::item::build_item;
use crate::runtime::notification::render_notification;
use crate::runtime::rows::{RawRow, RowReader};
use crate::runtime::validation::RecordValidator;

const DEADLINE_MESSAGE: &str = "invocation deadline reached before the row was started";

/// External systems one ingestion run talks to.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub objects: &'a dyn ObjectSource,
    pub records: &'a dyn RecordStore,
    pub notifier: &'a dyn Notifier,
    pub clock: &'a dyn Clock,
}

/// Decodes the trigger event and ingests the object it names.
pub fn handle_trigger_event(
    event: &Value,
    config: &IngestionConfig,
    budget: &RunBudget,
    collaborators: Collaborators<'_>,
) -> Result<IngestionResult, IngestError> {
    let source = source_from_event(event)?;
    handle_ingest(&source, config, budget, collaborators)
}

/// Ingests one uploaded CSV file.
///
/// Fetch and header problems abort the run with an [`IngestError`] before any
/// row is stored or published. After that every data row is handled on its own:
/// validated, written under its identifier (overwriting an earlier item with the
/// same key), and, only once the write succeeded, announced to the student.
/// Row failures are collected in the returned result and never abort the run.
pub fn handle_ingest(
    source: &SourceObject,
    config: &IngestionConfig,
    budget: &RunBudget,
    collaborators: Collaborators<'_>,
) -> Result<IngestionResult, IngestError> {
    let started_at = collaborators.clock.instant();
    tracing::info!(
        component = "ingest_handler",
        event = "ingest_started",
        container = %source.container,
        key = %source.key,
        table = %config.table_name,
    );

    let outcome = ingest_rows(source, config, budget, collaborators);
    let duration_ms = collaborators
        .clock
        .instant()
        .saturating_duration_since(started_at)
        .as_millis();

    match &outcome {
        Ok(result) => tracing::info!(
            component = "ingest_handler",
            event = "ingest_completed",
            container = %source.container,
            key = %source.key,
            source_sha256 = %result.source_sha256,
            total_rows = result.total_rows,
            persisted = result.persisted,
            notified = result.notified,
            failed = result.failures.len(),
            duration_ms,
        ),
        Err(error) => tracing::error!(
            component = "ingest_handler",
            event = "ingest_failed",
            container = %source.container,
            key = %source.key,
            kind = error.kind(),
            error = %error,
            duration_ms,
        ),
    }

    outcome
}

fn ingest_rows(
    source: &SourceObject,
    config: &IngestionConfig,
    budget: &RunBudget,
    collaborators: Collaborators<'_>,
) -> Result<IngestionResult, IngestError> {
    let contents = config
        .retry
        .run(|| collaborators.objects.fetch(&source.container, &source.key))
        .map_err(|exhausted| IngestError::SourceUnavailable {
            container: source.container.clone(),
            key: source.key.clone(),
            message: exhausted.to_string(),
        })?;

    let rows = RowReader::open(&contents, &config.column_aliases)?;
    let mut result = IngestionResult::new(source.clone(), source_fingerprint(&contents));
    let mut validator = RecordValidator::new();
    let mut out_of_time = false;

    for decoded in rows {
        result.total_rows += 1;

        if !out_of_time && !budget.allows_new_row(collaborators.clock.instant()) {
            out_of_time = true;
            tracing::warn!(
                component = "ingest_handler",
                event = "deadline_reached",
                key = %source.key,
                next_row = decoded.row,
                processed_rows = decoded.row - 1,
            );
        }
        if out_of_time {
            let student_id = decoded
                .fields
                .ok()
                .map(|raw| raw.id)
                .filter(|id| !id.is_empty());
            fail_row(
                &mut result,
                decoded.row,
                student_id,
                FailureReason::Deadline,
                DEADLINE_MESSAGE,
            );
            continue;
        }

        match decoded.fields {
            Ok(raw) => process_row(
                &mut result,
                decoded.row,
                raw,
                &mut validator,
                config,
                collaborators,
            ),
            Err(message) => fail_row(
                &mut result,
                decoded.row,
                None,
                FailureReason::InvalidRecord,
                message,
            ),
        }
    }

    Ok(result)
}

fn process_row(
    result: &mut IngestionResult,
    row: usize,
    raw: RawRow,
    validator: &mut RecordValidator,
    config: &IngestionConfig,
    collaborators: Collaborators<'_>,
) {
    let processed_at = collaborators.clock.now();
    let record = match validator.validate(raw) {
        Ok(record) => record.captured_at(processed_at),
        Err(invalid) => {
            fail_row(
                result,
                row,
                invalid.student_id,
                FailureReason::InvalidRecord,
                invalid.message,
            );
            return;
        }
    };
    let student_id = Some(record.student_id.clone());

    let item = build_item(&record, &config.key_attribute, processed_at);
    let stored = config.retry.run(|| {
        collaborators
            .records
            .put(&config.table_name, &record.student_id, &item)
    });
    if let Err(exhausted) = stored {
        fail_row(
            result,
            row,
            student_id,
            FailureReason::PersistenceError,
            exhausted.to_string(),
        );
        return;
    }
    validator.mark_stored(&record.student_id);
    result.persisted += 1;

    let notification = render_notification(
        &record,
        &config.notification.subject,
        config.notification.sender.as_deref(),
    );
    let published = config.retry.run(|| {
        collaborators.notifier.publish(
            &config.notification.topic,
            &notification.subject,
            &notification.body,
        )
    });
    match published {
        Ok(()) => result.notified += 1,
        Err(exhausted) => fail_row(
            result,
            row,
            student_id,
            FailureReason::NotificationError,
            exhausted.to_string(),
        ),
    }
}

fn fail_row(
    result: &mut IngestionResult,
    row: usize,
    student_id: Option<String>,
    reason: FailureReason,
    message: impl Into<String>,
) {
    let message = message.into();
    tracing::warn!(
        component = "ingest_handler",
        event = "row_failed",
        row,
        student_id = student_id.as_deref().unwrap_or(""),
        reason = reason.as_str(),
        message = %message,
    );
    result.record_failure(row, student_id, reason, message);
}
