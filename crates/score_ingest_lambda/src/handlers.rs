pub mod ingest;
pub mod trigger;
