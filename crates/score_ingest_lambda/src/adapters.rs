//! Collaborator seams. Each external service the handler talks to sits behind
//! a small synchronous trait so tests substitute in-memory fakes.

pub mod aws;
pub mod clock;
pub mod local;
pub mod notifier;
pub mod object_store;
pub mod record_store;
