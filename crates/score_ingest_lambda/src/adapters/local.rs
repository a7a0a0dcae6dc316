//! Offline collaborators backing the `ingest_local` dry-run binary.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::adapters::notifier::Notifier;
use crate::adapters::object_store::ObjectSource;
use crate::adapters::record_store::RecordStore;
use crate::runtime::error::CollaboratorError;
use crate::runtime::item::ItemAttributes;

/// Treats the container as a directory and the key as a path below it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileObjectSource;

impl ObjectSource for FileObjectSource {
    fn fetch(&self, container: &str, key: &str) -> Result<Vec<u8>, CollaboratorError> {
        let path = PathBuf::from(container).join(key);
        std::fs::read(&path).map_err(|error| {
            let message = format!("failed to read {}: {error}", path.display());
            match error.kind() {
                ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock => {
                    CollaboratorError::transient(message)
                }
                _ => CollaboratorError::permanent(message),
            }
        })
    }
}

/// Items keyed by `(table, key)`; later puts replace earlier ones.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    items: Mutex<BTreeMap<(String, String), ItemAttributes>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, table: &str, key: &str) -> Option<ItemAttributes> {
        self.items
            .lock()
            .ok()?
            .get(&(table.to_string(), key.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordStore for InMemoryRecordStore {
    fn put(
        &self,
        table: &str,
        key: &str,
        attributes: &ItemAttributes,
    ) -> Result<(), CollaboratorError> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| CollaboratorError::permanent("in-memory store lock poisoned"))?;
        items.insert((table.to_string(), key.to_string()), attributes.clone());
        Ok(())
    }
}

/// Logs each message instead of delivering it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingNotifier;

impl Notifier for LoggingNotifier {
    fn publish(&self, topic: &str, subject: &str, body: &str) -> Result<(), CollaboratorError> {
        tracing::info!(
            component = "local_notifier",
            event = "notification_logged",
            topic,
            subject,
            body,
        );
        Ok(())
    }
}
