use crate::runtime::error::CollaboratorError;
use crate::runtime::item::ItemAttributes;

/// Key-value table writes. `put` overwrites any existing item with the same
/// key.
pub trait RecordStore {
    fn put(
        &self,
        table: &str,
        key: &str,
        attributes: &ItemAttributes,
    ) -> Result<(), CollaboratorError>;
}
