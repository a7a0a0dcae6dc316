use crate::runtime::error::CollaboratorError;

pub trait Notifier {
    fn publish(&self, topic: &str, subject: &str, body: &str) -> Result<(), CollaboratorError>;
}
