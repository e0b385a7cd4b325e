use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the review pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An output file could not be created or written.
    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A raw file is readable but its content is not the expected JSON shape.
    #[error("Malformed record in {path}: {reason}")]
    MalformedRecord { path: PathBuf, reason: String },

    /// A required upstream table does not exist.
    #[error("Missing processed input {0}. Run the transform step first.")]
    MissingInput(PathBuf),

    /// A table is present but lacks a column the step depends on.
    #[error("Table {table} has no '{column}' column")]
    MissingColumn { table: String, column: String },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A CSV table could not be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the pipeline crates.
pub type Result<T> = std::result::Result<T, PipelineError>;
