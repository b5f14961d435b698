//! Update reconciliation engine
//!
//! Decides, for one local style and its remote source, whether to apply an
//! update, absorb it as a digest refresh, or skip with a reason. The
//! decision chain runs in a fixed order and stops at the first rejection:
//!
//! 1. edit guard (unless `ignore_digest`)
//! 2. legacy MD5 path or versioned usercss path, producing a candidate
//! 3. save guard: stamp, name handling, no-op detection, ambiguity check, save

mod outcome;
mod remote;

pub use outcome::{Outcome, ReconcileOptions, SkipReason};
pub use remote::{parse_md5, parse_style_json};

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use style_meta::compare_versions;
use tracing::debug;

use crate::collab::{FetchError, FetchOptions, Fetcher, StyleStore, UsercssBuilder};
use crate::digest::{sections_equal, style_digest};
use crate::error::{Error, Result};
use crate::model::{SaveReason, Style, StyleDocument};

/// Early exit from the decision chain
enum Reject {
    Skip(SkipReason),
    Fault(Error),
}

impl From<SkipReason> for Reject {
    fn from(reason: SkipReason) -> Self {
        Reject::Skip(reason)
    }
}

impl From<FetchError> for Reject {
    fn from(err: FetchError) -> Self {
        Reject::Skip(err.into())
    }
}

impl From<Error> for Reject {
    fn from(err: Error) -> Self {
        Reject::Fault(err)
    }
}

impl From<style_meta::Error> for Reject {
    fn from(err: style_meta::Error) -> Self {
        Reject::Fault(err.into())
    }
}

type Step<T> = std::result::Result<T, Reject>;

/// Reconciles local styles against their remote sources
#[derive(Clone)]
pub struct ReconcileEngine {
    store: Arc<dyn StyleStore>,
    fetcher: Arc<dyn Fetcher>,
    builder: Arc<dyn UsercssBuilder>,
}

impl ReconcileEngine {
    pub fn new(
        store: Arc<dyn StyleStore>,
        fetcher: Arc<dyn Fetcher>,
        builder: Arc<dyn UsercssBuilder>,
    ) -> Self {
        Self {
            store,
            fetcher,
            builder,
        }
    }

    /// Run the decision chain for one style.
    ///
    /// Skips (including transport failures) are returned as
    /// [`Outcome::Skipped`]; only build and storage faults are errors.
    pub async fn reconcile(&self, style: &Style, options: ReconcileOptions) -> Result<Outcome> {
        let outcome = match self.run(style, options).await {
            Ok(outcome) => outcome,
            Err(Reject::Skip(reason)) => Outcome::Skipped(reason),
            Err(Reject::Fault(err)) => {
                debug!(id = %style.id, error = %err, "reconcile failed");
                return Err(err);
            }
        };
        debug!(id = %style.id, ?outcome, "reconciled");
        Ok(outcome)
    }

    async fn run(&self, style: &Style, options: ReconcileOptions) -> Step<Outcome> {
        if !options.ignore_digest {
            check_edit_guard(style)?;
        }

        let candidate = if style.is_usercss() {
            self.check_versioned(style, options).await?
        } else {
            self.check_legacy(style, options).await?
        };

        self.save_guard(style, candidate, options).await
    }

    async fn check_legacy(&self, style: &Style, options: ReconcileOptions) -> Step<StyleDocument> {
        let update_url = update_url(style)?;

        let mut fetched_md5 = None;
        if let Some(md5_url) = style.md5_url.as_deref() {
            let text = self.fetcher.fetch(md5_url, FetchOptions::default()).await?;
            let md5 = parse_md5(&text)?;
            if style.original_md5.as_deref() == Some(md5)
                && style.original_digest.is_some()
                && !options.ignore_digest
            {
                return Err(SkipReason::SameMd5.into());
            }
            fetched_md5 = Some(md5.to_string());
        }

        // Plain GET: some origins reject POST for style documents
        let text = self.fetcher.fetch(update_url, FetchOptions::default()).await?;
        let mut doc = parse_style_json(&text)?;
        if fetched_md5.is_some() {
            doc.original_md5 = fetched_md5;
        }
        // Version fields belong to the usercss path only
        doc.usercss_data = None;
        Ok(doc)
    }

    async fn check_versioned(&self, style: &Style, options: ReconcileOptions) -> Step<StyleDocument> {
        let update_url = update_url(style)?;
        let text = self.fetcher.fetch(update_url, FetchOptions::default()).await?;
        let meta = self.builder.parse_metadata(&text)?;

        let local_version = style
            .usercss_data
            .as_ref()
            .map(|data| data.version.as_str())
            .unwrap_or_default();

        match compare_versions(local_version, &meta.data.version) {
            Ordering::Equal => {
                // Reinstalling the same version needs explicit intent
                if !options.ignore_digest {
                    return Err(SkipReason::SameVersion.into());
                }
                if style.source_code.as_deref() == Some(text.as_str()) {
                    return Err(SkipReason::SameCode.into());
                }
            }
            Ordering::Greater => return Err(SkipReason::ErrorVersion.into()),
            Ordering::Less => {}
        }

        let mut doc = self.builder.build(&meta)?;
        // MD5 belongs to the legacy path only
        doc.original_md5 = None;
        Ok(doc)
    }

    async fn save_guard(
        &self,
        style: &Style,
        mut doc: StyleDocument,
        options: ReconcileOptions,
    ) -> Step<Outcome> {
        doc.id = Some(style.id);
        doc.update_date = Some(Utc::now());
        doc.reason = Some(SaveReason::Update);

        // Keep a local rename unless the remote renamed to the same name
        let renamed_locally = style.original_name.as_deref() != Some(style.name.as_str());
        if renamed_locally && doc.name.as_deref() != Some(style.name.as_str()) {
            doc.name = None;
        } else {
            doc.original_name = doc.name.clone();
        }

        if sections_equal(&doc.sections, &style.sections) {
            // Persisted even on dry runs: whitespace-only edits still move the baseline.
            // The remote markers move too, so the next check stops at the MD5 or version.
            let patch = StyleDocument {
                id: Some(style.id),
                sections: style.sections.clone(),
                original_digest: Some(style_digest(&style.sections)),
                original_md5: doc.original_md5,
                usercss_data: doc.usercss_data,
                source_code: doc.source_code,
                reason: Some(SaveReason::UpdateDigest),
                ..Default::default()
            };
            self.store.save_full(patch).await?;
            return Err(SkipReason::SameCode.into());
        }

        if style.original_digest.is_none() && !options.ignore_digest {
            return Err(SkipReason::MaybeEdited.into());
        }

        doc.original_digest = Some(style_digest(&doc.sections));

        if !options.save {
            return Ok(Outcome::Preview(Box::new(style.merged(doc))));
        }

        let saved = if doc.is_usercss() {
            self.store.save_versioned(doc).await?
        } else {
            self.store.save_full(doc).await?
        };
        Ok(Outcome::Updated(Box::new(saved)))
    }
}

fn check_edit_guard(style: &Style) -> Step<()> {
    match style.original_digest.as_deref() {
        Some(original) if original != style_digest(&style.sections) => {
            Err(SkipReason::Edited.into())
        }
        _ => Ok(()),
    }
}

fn update_url(style: &Style) -> Step<&str> {
    style
        .update_url
        .as_deref()
        .ok_or_else(|| Error::MissingUpdateUrl { id: style.id }.into())
}
