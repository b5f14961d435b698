//! Error types for style-core
//!
//! Skip reasons are not errors: they travel as [`crate::SkipReason`] values.
//! This enum covers the faults that abort a reconciliation.

use crate::model::StyleId;

/// Result type for style-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in style-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No style with this id in the store
    #[error("Style not found: #{id}")]
    StyleNotFound { id: StyleId },

    /// A document was saved without saying which style it belongs to
    #[error("Style document has no id")]
    MissingStyleId,

    /// The style has no remote source to check
    #[error("Style #{id} has no update URL")]
    MissingUpdateUrl { id: StyleId },

    /// A versioned save was requested for a document without usercss metadata
    #[error("Style #{id} is not a usercss style")]
    NotUsercss { id: StyleId },

    /// A check-all run is already in flight
    #[error("An update check is already running")]
    CheckInProgress,

    /// HTTP client could not be constructed
    #[error("HTTP client error: {message}")]
    HttpClient { message: String },

    /// Filesystem error from style-fs
    #[error(transparent)]
    Fs(#[from] style_fs::Error),

    /// Usercss metadata or build error from style-meta
    #[error(transparent)]
    Build(#[from] style_meta::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
