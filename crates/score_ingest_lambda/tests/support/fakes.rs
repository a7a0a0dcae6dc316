#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use score_ingest_core::budget::RunBudget;
use score_ingest_core::config::IngestionConfig;
use score_ingest_core::contract::{IngestionResult, SourceObject};
use score_ingest_core::error::{CollaboratorError, IngestError};
use score_ingest_core::item::ItemAttributes;
use score_ingest_core::retry::RetryPolicy;
use score_ingest_lambda::adapters::clock::Clock;
use score_ingest_lambda::adapters::notifier::Notifier;
use score_ingest_lambda::adapters::object_store::ObjectSource;
use score_ingest_lambda::adapters::record_store::RecordStore;
use score_ingest_lambda::handlers::ingest::{handle_ingest, Collaborators};

pub const TABLE: &str = "student_scores";
pub const TOPIC: &str = "arn:aws:sns:eu-west-1:000000000000:student-performance-reports";
pub const BUCKET: &str = "uploads";
pub const KEY: &str = "scores/march.csv";

pub fn test_config() -> IngestionConfig {
    let mut config = IngestionConfig::new(TABLE, TOPIC);
    config.retry = RetryPolicy::no_delay(3);
    config
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 5)
        .single()
        .expect("valid timestamp")
}

/// Object store holding files keyed by `(container, key)`. Counts fetches and
/// can fail the next few fetches with a transient error.
#[derive(Default)]
pub struct MemoryObjectSource {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    transient_failures: Mutex<u32>,
    fetches: Mutex<u32>,
}

impl MemoryObjectSource {
    pub fn with_object(container: &str, key: &str, contents: impl Into<Vec<u8>>) -> Self {
        let source = Self::default();
        source
            .objects
            .lock()
            .expect("poisoned mutex")
            .insert((container.to_string(), key.to_string()), contents.into());
        source
    }

    pub fn failing_first(self, attempts: u32) -> Self {
        *self.transient_failures.lock().expect("poisoned mutex") = attempts;
        self
    }

    pub fn fetches(&self) -> u32 {
        *self.fetches.lock().expect("poisoned mutex")
    }
}

impl ObjectSource for MemoryObjectSource {
    fn fetch(&self, container: &str, key: &str) -> Result<Vec<u8>, CollaboratorError> {
        *self.fetches.lock().expect("poisoned mutex") += 1;

        let mut failures = self.transient_failures.lock().expect("poisoned mutex");
        if *failures > 0 {
            *failures -= 1;
            return Err(CollaboratorError::transient("SlowDown"));
        }

        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(&(container.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| CollaboratorError::permanent(format!("NoSuchKey: {container}/{key}")))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutCall {
    pub table: String,
    pub key: String,
    pub attributes: ItemAttributes,
}

/// Records every put and keeps the resulting table state. Identifiers in
/// `failing_ids` are rejected on every attempt; `transient` controls whether
/// the rejection is retryable.
#[derive(Default)]
pub struct RecordingStore {
    puts: Mutex<Vec<PutCall>>,
    items: Mutex<BTreeMap<String, ItemAttributes>>,
    failing_ids: HashSet<String>,
    transient: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(ids: &[&str], transient: bool) -> Self {
        Self {
            failing_ids: ids.iter().map(|id| id.to_string()).collect(),
            transient,
            ..Self::default()
        }
    }

    pub fn puts(&self) -> Vec<PutCall> {
        self.puts.lock().expect("poisoned mutex").clone()
    }

    pub fn put_attempts_for(&self, key: &str) -> usize {
        self.puts().iter().filter(|call| call.key == key).count()
    }

    pub fn item(&self, key: &str) -> Option<ItemAttributes> {
        self.items.lock().expect("poisoned mutex").get(key).cloned()
    }

    pub fn item_count(&self) -> usize {
        self.items.lock().expect("poisoned mutex").len()
    }
}

impl RecordStore for RecordingStore {
    fn put(
        &self,
        table: &str,
        key: &str,
        attributes: &ItemAttributes,
    ) -> Result<(), CollaboratorError> {
        self.puts.lock().expect("poisoned mutex").push(PutCall {
            table: table.to_string(),
            key: key.to_string(),
            attributes: attributes.clone(),
        });

        if self.failing_ids.contains(key) {
            let message = format!("put rejected for {key}");
            return Err(if self.transient {
                CollaboratorError::transient(message)
            } else {
                CollaboratorError::permanent(message)
            });
        }

        self.items
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string(), attributes.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishCall {
    pub topic: String,
    pub subject: String,
    pub body: String,
}

/// Records every publish. Bodies greeting a name in `failing_names` are
/// rejected with a retryable error.
#[derive(Default)]
pub struct RecordingNotifier {
    published: Mutex<Vec<PublishCall>>,
    failing_names: HashSet<String>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(names: &[&str]) -> Self {
        Self {
            failing_names: names.iter().map(|name| name.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<PublishCall> {
        self.published.lock().expect("poisoned mutex").clone()
    }

    pub fn delivered(&self) -> Vec<PublishCall> {
        self.published()
            .into_iter()
            .filter(|call| !self.rejects(&call.body))
            .collect()
    }

    fn rejects(&self, body: &str) -> bool {
        self.failing_names
            .iter()
            .any(|name| body.starts_with(&format!("Hello {name},")))
    }
}

impl Notifier for RecordingNotifier {
    fn publish(&self, topic: &str, subject: &str, body: &str) -> Result<(), CollaboratorError> {
        self.published
            .lock()
            .expect("poisoned mutex")
            .push(PublishCall {
                topic: topic.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });

        if self.rejects(body) {
            return Err(CollaboratorError::transient("Throttling: rate exceeded"));
        }
        Ok(())
    }
}

/// Wall clock frozen at [`fixed_now`]; the monotonic clock never moves.
pub struct FixedClock {
    instant: Instant,
}

impl FixedClock {
    pub fn new() -> Self {
        Self {
            instant: Instant::now(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        fixed_now()
    }

    fn instant(&self) -> Instant {
        self.instant
    }
}

/// Monotonic clock that advances by `step` every time it is read.
pub struct SteppingClock {
    origin: Instant,
    step: Duration,
    reads: Mutex<u32>,
}

impl SteppingClock {
    pub fn new(step: Duration) -> Self {
        Self {
            origin: Instant::now(),
            step,
            reads: Mutex::new(0),
        }
    }

    pub fn origin(&self) -> Instant {
        self.origin
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        fixed_now()
    }

    fn instant(&self) -> Instant {
        let mut reads = self.reads.lock().expect("poisoned mutex");
        *reads += 1;
        self.origin + self.step * *reads
    }
}

pub fn ingest(
    objects: &MemoryObjectSource,
    records: &RecordingStore,
    notifier: &RecordingNotifier,
    clock: &dyn Clock,
    budget: RunBudget,
) -> Result<IngestionResult, IngestError> {
    let collaborators = Collaborators {
        objects,
        records,
        notifier,
        clock,
    };
    handle_ingest(
        &SourceObject::new(BUCKET, KEY),
        &test_config(),
        &budget,
        collaborators,
    )
}
