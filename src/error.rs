use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the dashboard core.
///
/// Only loading can fail; filtering and aggregation are total over a
/// loaded [`Dataset`](crate::data::model::Dataset).
#[derive(Debug, Error)]
pub enum Error {
    #[error("cannot read source {path}: {reason}")]
    SourceUnreadable { path: PathBuf, reason: String },
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("required column \"{column}\" is missing")]
    SchemaMissing { column: String },
    #[error("row {row}: SAP ID \"{value}\" is not a number")]
    InvalidSapId { row: usize, value: String },
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("failed to export view: {0}")]
    Export(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
