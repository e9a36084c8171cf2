//! Metadata error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("Unsupported metadata value: {0}")]
    UnsupportedValue(String),

    #[error("Metadata key too long ({length} bytes): {key}")]
    KeyTooLong { key: String, length: usize },

    #[error("Metadata map keys must be text, found {0}")]
    NonTextKey(String),

    #[error("CBOR error: {0}")]
    Cbor(String),

    #[error("Metadata does not match schema: {0}")]
    Schema(String),

    #[error("No metadata under label {0}")]
    MissingLabel(u64),
}

pub type Result<T> = std::result::Result<T, MetadataError>;
