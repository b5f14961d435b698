//! File-backed collaborators
//!
//! Everything lives under one data directory:
//!
//! ```text
//! <data_dir>/
//!   styles/<id>.json   one style per file
//!   update-log.json    activity log
//!   last-check         RFC 3339 time of the last check
//! ```

mod json_store;
mod log_store;
mod state;

pub use json_store::JsonStyleStore;
pub use log_store::JsonLogStore;
pub use state::JsonStateStore;

use chrono::{DateTime, Utc};

use crate::Result;

pub const STYLES_DIR: &str = "styles";
pub const LOG_FILE: &str = "update-log.json";
pub const LAST_CHECK_FILE: &str = "last-check";

/// Persistence for the scheduler's last-check time
pub trait StateStore: Send + Sync {
    /// `None` when no check was ever recorded.
    fn load_last_check(&self) -> Result<Option<DateTime<Utc>>>;

    fn save_last_check(&self, at: DateTime<Utc>) -> Result<()>;
}
