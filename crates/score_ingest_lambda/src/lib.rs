//! AWS-oriented adapters and handlers for student score ingestion.
//!
//! This crate owns runtime integration details (the Lambda handler, trigger
//! event decoding, and S3/DynamoDB/SNS adapters) and exposes a single runtime
//! module boundary for the contract, parsing, and policy primitives of
//! `score_ingest_core`.

pub mod adapters;
pub mod handlers;
pub mod runtime;
