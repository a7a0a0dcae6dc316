//! Shared student score ingestion domain primitives.
//!
//! This crate owns the deterministic parts of the ingestion pipeline: result
//! contracts, header alias resolution, CSV row decoding, record validation,
//! item and notification rendering, retry and deadline policy, and
//! configuration loading. It intentionally excludes AWS SDK and Lambda runtime
//! concerns; those live in `score_ingest_lambda`.

pub mod budget;
pub mod columns;
pub mod config;
pub mod contract;
pub mod error;
pub mod item;
pub mod notification;
pub mod retry;
pub mod rows;
pub mod validation;
