//! Error types for style-meta

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("No ==UserStyle== metadata block found")]
    MissingMetadata,

    #[error("Missing required metadata field @{field}")]
    MissingField { field: &'static str },

    #[error("Unsupported preprocessor: {name}")]
    UnsupportedPreprocessor { name: String },

    #[error("Unbalanced braces starting at offset {offset}")]
    UnbalancedBraces { offset: usize },

    #[error("Invalid @-moz-document target: {target}")]
    InvalidTarget { target: String },
}
