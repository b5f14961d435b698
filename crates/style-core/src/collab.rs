//! Collaborator interfaces consumed by the reconciliation engine
//!
//! The engine never touches storage or the network directly; it goes
//! through these traits so the file-backed and HTTP implementations can be
//! swapped for in-memory doubles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use style_meta::UsercssMeta;

use crate::Result;
use crate::model::{Style, StyleDocument, StyleId};

/// Persistent style storage
#[async_trait]
pub trait StyleStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Style>>;

    async fn get_by_id(&self, id: StyleId) -> Result<Option<Style>>;

    /// Merge a legacy document (or a digest patch) onto the stored style.
    async fn save_full(&self, doc: StyleDocument) -> Result<Style>;

    /// Merge a usercss document onto the stored style.
    async fn save_versioned(&self, doc: StyleDocument) -> Result<Style>;

    fn strip_code(&self, style: &Style) -> Style {
        style.without_code()
    }
}

/// Options for a single fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Request body; `None` issues a plain GET.
    pub body: Option<String>,
}

/// Transport failure, carrying the numeric status (`0` = unreachable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("server unreachable")]
    Unreachable,

    #[error("HTTP error: {0}")]
    Status(u16),
}

impl FetchError {
    /// HTTP 503 Service Unavailable
    pub const SERVICE_UNAVAILABLE: u16 = 503;

    pub fn status(&self) -> u16 {
        match self {
            FetchError::Unreachable => 0,
            FetchError::Status(code) => *code,
        }
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            0 => FetchError::Unreachable,
            code => FetchError::Status(code),
        }
    }
}

/// Remote text fetcher
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, options: FetchOptions) -> std::result::Result<String, FetchError>;
}

/// Build pipeline for versioned (usercss) styles
pub trait UsercssBuilder: Send + Sync {
    fn parse_metadata(&self, text: &str) -> style_meta::Result<UsercssMeta>;

    fn build(&self, meta: &UsercssMeta) -> style_meta::Result<StyleDocument>;
}

/// Default pipeline backed by `style-meta`
#[derive(Debug, Default, Clone, Copy)]
pub struct MetaBuilder;

impl UsercssBuilder for MetaBuilder {
    fn parse_metadata(&self, text: &str) -> style_meta::Result<UsercssMeta> {
        style_meta::parse_metadata(text)
    }

    fn build(&self, meta: &UsercssMeta) -> style_meta::Result<StyleDocument> {
        style_meta::build(meta).map(StyleDocument::from)
    }
}

/// Persisted activity log contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDocument {
    pub lines: Vec<String>,
}

/// Storage for the activity log
#[async_trait]
pub trait LogStore: Send + Sync {
    /// `None` when nothing was ever written.
    async fn read_log(&self) -> Result<Option<LogDocument>>;

    async fn write_log(&self, doc: &LogDocument) -> Result<()>;
}
