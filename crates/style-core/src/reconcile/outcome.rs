//! Reconciliation outcomes and skip reasons

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::collab::FetchError;
use crate::model::Style;

/// Why a style was not updated.
///
/// The display text is user-visible status text and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    Edited,
    MaybeEdited,
    SameMd5,
    SameCode,
    SameVersion,
    ErrorMd5,
    ErrorJson,
    ErrorVersion,
    /// Transport failure with its numeric status (`0` = unreachable)
    Transport(u16),
}

impl SkipReason {
    /// Only "service unavailable" earns an automatic retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SkipReason::Transport(FetchError::SERVICE_UNAVAILABLE))
    }

    /// The remote has nothing new for this style.
    pub fn is_up_to_date(&self) -> bool {
        matches!(
            self,
            SkipReason::SameMd5 | SkipReason::SameCode | SkipReason::SameVersion
        )
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Edited => f.write_str("locally edited"),
            SkipReason::MaybeEdited => f.write_str("may be locally edited"),
            SkipReason::SameMd5 => f.write_str("up-to-date: MD5 is unchanged"),
            SkipReason::SameCode => f.write_str("up-to-date: code sections are unchanged"),
            SkipReason::SameVersion => f.write_str("up-to-date: version is unchanged"),
            SkipReason::ErrorMd5 => f.write_str("error: MD5 is invalid"),
            SkipReason::ErrorJson => f.write_str("error: JSON is invalid"),
            SkipReason::ErrorVersion => f.write_str("error: version is older than installed style"),
            SkipReason::Transport(0) => f.write_str("server unreachable"),
            SkipReason::Transport(status) => write!(f, "{status}"),
        }
    }
}

impl From<FetchError> for SkipReason {
    fn from(err: FetchError) -> Self {
        SkipReason::Transport(err.status())
    }
}

/// Result of one reconciliation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The update was persisted; carries the saved style.
    Updated(Box<Style>),
    /// Dry run: the style as it would look after the update, not persisted.
    Preview(Box<Style>),
    Skipped(SkipReason),
}

impl Outcome {
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Outcome::Skipped(reason) => Some(*reason),
            _ => None,
        }
    }

    /// The resulting style for updates and previews.
    pub fn style(&self) -> Option<&Style> {
        match self {
            Outcome::Updated(style) | Outcome::Preview(style) => Some(style),
            Outcome::Skipped(_) => None,
        }
    }
}

/// Flags for a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOptions {
    /// Skip the edit guard; set for explicit manual re-checks.
    pub ignore_digest: bool,
    /// Persist on success; `false` is a dry run.
    pub save: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            ignore_digest: false,
            save: true,
        }
    }
}
