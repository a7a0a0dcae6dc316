pub use score_ingest_core::{
    budget, columns, config, contract, error, item, notification, retry, rows, validation,
};
