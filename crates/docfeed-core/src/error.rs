//! Error types for the docfeed-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the docfeed library.
#[derive(Error, Debug)]
pub enum FeedError {
    /// A single input document could not be processed.
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// Reading or writing the canonical feed failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors that make a whole document unusable.
///
/// Missing substructures inside a readable document are never reported
/// here; extractors fall back to empty fields instead.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The file could not be opened or read.
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The message is not parseable as MIME at all.
    #[error("cannot parse message {path}: {reason}")]
    Mime { path: PathBuf, reason: String },

    /// The file extension does not map to any known document type.
    #[error("unsupported document type: {0}")]
    UnsupportedType(String),
}

/// Errors from the backup-then-write persistence path.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// Snapshotting the previous file failed.
    #[error("backup of {path} failed: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the file itself failed.
    #[error("write to {path} failed: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Records could not be serialized.
    #[error("failed to encode records: {0}")]
    Encode(#[source] serde_json::Error),

    /// An existing feed file is not valid JSON.
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No record carries the requested id.
    #[error("no record with id {0}")]
    UnknownId(String),
}

/// Result type for the docfeed library.
pub type Result<T> = std::result::Result<T, FeedError>;
