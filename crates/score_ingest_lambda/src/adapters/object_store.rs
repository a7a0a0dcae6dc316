use crate::runtime::error::CollaboratorError;

pub trait ObjectSource {
    fn fetch(&self, container: &str, key: &str) -> Result<Vec<u8>, CollaboratorError>;
}
