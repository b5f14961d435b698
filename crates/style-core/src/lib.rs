//! Update checking for remotely hosted styles
//!
//! Layer 1 of the workspace. Given locally stored styles that may have been
//! edited by the user, this crate decides per style whether a remote update
//! is applied, absorbed as a digest refresh, or skipped with a reason.
//!
//! - [`reconcile`]: the decision chain ([`ReconcileEngine`])
//! - [`orchestrator`]: single and bulk checks with the one-shot 503 retry
//! - [`scheduler`]: interval-driven, debounced check triggers
//! - [`activity_log`]: batched, rolling, user-facing log
//! - [`store`] and [`http`]: file-backed and HTTP collaborators

pub mod activity_log;
pub mod collab;
pub mod config;
pub mod digest;
pub mod error;
pub mod http;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod prefs;
pub mod reconcile;
pub mod scheduler;
pub mod store;

pub use activity_log::ActivityLog;
pub use collab::{
    FetchError, FetchOptions, Fetcher, LogDocument, LogStore, MetaBuilder, StyleStore,
    UsercssBuilder,
};
pub use config::{HttpSettings, LogSettings, UpdaterConfig};
pub use digest::{sections_equal, style_digest};
pub use error::{Error, Result};
pub use http::HttpFetcher;
pub use model::{SaveReason, Style, StyleDocument, StyleId};
pub use orchestrator::{
    CheckAllOptions, CheckEvent, CheckOrchestrator, CheckRequest, CheckResult, CheckSummary,
    CheckTarget, Observer, Trigger,
};
pub use prefs::{Preferences, UpdatePrefs};
pub use reconcile::{Outcome, ReconcileEngine, ReconcileOptions, SkipReason};
pub use scheduler::{Scheduler, next_check_delay};
pub use store::{JsonLogStore, JsonStateStore, JsonStyleStore, StateStore};
pub use style_meta::Section;
