//! Check orchestration: one style or all of them
//!
//! The orchestrator resolves styles from the store, runs them through the
//! [`ReconcileEngine`], retries a "service unavailable" failure once per
//! style, writes one activity log line per outcome and reports progress to
//! an optional observer channel.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::activity_log::ActivityLog;
use crate::collab::{Fetcher, StyleStore, UsercssBuilder};
use crate::model::{Style, StyleId};
use crate::reconcile::{Outcome, ReconcileEngine, ReconcileOptions, SkipReason};
use crate::scheduler::Scheduler;
use crate::{Error, Result};

/// Progress channel for a check run; closing the receiver is harmless.
pub type Observer = mpsc::UnboundedSender<CheckEvent>;

/// Progress events reported while checking
#[derive(Debug, Clone, PartialEq)]
pub enum CheckEvent {
    /// Number of styles about to be checked
    Count(usize),
    /// A style was updated (or would be, on a dry run)
    Updated { style: Box<Style> },
    /// A style was skipped or failed; the style is sent without code
    Error {
        error: String,
        reason: Option<SkipReason>,
        style: Box<Style>,
    },
    /// The requested id could not be resolved to a style
    Unresolved { id: StyleId, error: String },
    Done,
}

/// Which style a single check targets
#[derive(Debug, Clone, PartialEq)]
pub enum CheckTarget {
    /// Looked up in the store on every attempt
    Id(StyleId),
    Style(Box<Style>),
}

/// A single check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckRequest {
    pub target: CheckTarget,
    pub save: bool,
    pub ignore_digest: bool,
}

impl CheckRequest {
    pub fn by_id(id: StyleId) -> Self {
        Self {
            target: CheckTarget::Id(id),
            save: true,
            ignore_digest: false,
        }
    }

    pub fn for_style(style: Style) -> Self {
        Self {
            target: CheckTarget::Style(Box::new(style)),
            save: true,
            ignore_digest: false,
        }
    }

    pub fn with_save(mut self, save: bool) -> Self {
        self.save = save;
        self
    }

    pub fn with_ignore_digest(mut self, ignore_digest: bool) -> Self {
        self.ignore_digest = ignore_digest;
        self
    }

    fn options(&self) -> ReconcileOptions {
        ReconcileOptions {
            ignore_digest: self.ignore_digest,
            save: self.save,
        }
    }
}

/// What started a check-all run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Scheduled,
    Manual,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Scheduled => f.write_str("Scheduled"),
            Trigger::Manual => f.write_str("Manual"),
        }
    }
}

/// Options for [`CheckOrchestrator::check_all`]
#[derive(Debug, Clone)]
pub struct CheckAllOptions {
    pub save: bool,
    pub ignore_digest: bool,
    pub trigger: Trigger,
    pub observer: Option<Observer>,
}

impl Default for CheckAllOptions {
    fn default() -> Self {
        Self {
            save: true,
            ignore_digest: false,
            trigger: Trigger::Manual,
            observer: None,
        }
    }
}

impl CheckAllOptions {
    pub fn scheduled() -> Self {
        Self {
            trigger: Trigger::Scheduled,
            ..Default::default()
        }
    }
}

/// Result for one style of a check-all run
#[derive(Debug)]
pub struct CheckResult {
    pub id: StyleId,
    pub name: String,
    pub outcome: Result<Outcome>,
}

/// Results of a check-all run, in no particular order
#[derive(Debug, Default)]
pub struct CheckSummary {
    pub results: Vec<CheckResult>,
}

impl CheckSummary {
    pub fn checked(&self) -> usize {
        self.results.len()
    }

    /// Styles that were updated or, on a dry run, have an update available.
    pub fn updated(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Ok(Outcome::Updated(_) | Outcome::Preview(_))))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, Ok(Outcome::Skipped(_))))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_err()).count()
    }

    pub fn get(&self, id: StyleId) -> Option<&CheckResult> {
        self.results.iter().find(|r| r.id == id)
    }
}

/// Releases the single-flight flag when a check-all run ends.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::CheckInProgress)?;
        Ok(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives reconciliation for one or many styles
pub struct CheckOrchestrator {
    engine: ReconcileEngine,
    store: Arc<dyn StyleStore>,
    log: ActivityLog,
    scheduler: Option<Arc<Scheduler>>,
    retry_delay: Duration,
    /// Ids already retried in the current run
    retried: Mutex<HashSet<StyleId>>,
    running: AtomicBool,
}

impl CheckOrchestrator {
    pub fn new(
        store: Arc<dyn StyleStore>,
        fetcher: Arc<dyn Fetcher>,
        builder: Arc<dyn UsercssBuilder>,
        log: ActivityLog,
    ) -> Self {
        Self {
            engine: ReconcileEngine::new(Arc::clone(&store), fetcher, builder),
            store,
            log,
            scheduler: None,
            retry_delay: Duration::from_secs(1),
            retried: Mutex::new(HashSet::new()),
            running: AtomicBool::new(false),
        }
    }

    /// Reset this scheduler's interval whenever a check-all run starts.
    pub fn with_scheduler(mut self, scheduler: Arc<Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn activity_log(&self) -> &ActivityLog {
        &self.log
    }

    /// Check one style.
    ///
    /// Skips come back as [`Outcome::Skipped`]; build and storage faults as
    /// errors. Either way one activity log line is written and one event is
    /// sent to `observer`.
    pub async fn check_one(&self, request: &CheckRequest, observer: Option<&Observer>) -> Result<Outcome> {
        loop {
            let style = match self.resolve(&request.target).await {
                Ok(style) => style,
                Err(err) => {
                    if let CheckTarget::Id(id) = &request.target {
                        self.log.log(format!("skipped ({err}) #{id}"));
                        notify(
                            observer,
                            CheckEvent::Unresolved {
                                id: *id,
                                error: err.to_string(),
                            },
                        );
                    }
                    return Err(err);
                }
            };

            match self.engine.reconcile(&style, request.options()).await {
                Ok(Outcome::Skipped(reason)) if reason.is_retryable() && self.claim_retry(style.id) => {
                    info!(id = %style.id, delay_ms = self.retry_delay.as_millis() as u64, "{reason}, retrying once");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Ok(outcome) => {
                    self.report(&style, &outcome, observer);
                    return Ok(outcome);
                }
                Err(err) => {
                    self.report_error(&style, &err.to_string(), None, observer);
                    return Err(err);
                }
            }
        }
    }

    /// Check every style that has an update URL.
    ///
    /// Fails with [`Error::CheckInProgress`] while another run is active.
    pub async fn check_all(&self, options: CheckAllOptions) -> Result<CheckSummary> {
        let _guard = RunGuard::acquire(&self.running)?;
        if let Some(scheduler) = &self.scheduler {
            scheduler.reset_interval();
        }
        self.clear_retries();
        self.log.set_batching(true);

        let result = self.run_all(&options).await;

        self.clear_retries();
        self.log.set_batching(false);
        if let Err(err) = self.log.flush().await {
            warn!(error = %err, "failed to flush activity log");
        }
        result
    }

    async fn run_all(&self, options: &CheckAllOptions) -> Result<CheckSummary> {
        let styles: Vec<Style> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .filter(|style| style.update_url.is_some())
            .collect();

        self.log.log("");
        self.log
            .log(format!("{} update check for {} styles", options.trigger, styles.len()));
        let observer = options.observer.as_ref();
        notify(observer, CheckEvent::Count(styles.len()));

        let checks = styles.into_iter().map(|style| {
            let id = style.id;
            let name = style.name.clone();
            let request = CheckRequest {
                target: CheckTarget::Style(Box::new(style)),
                save: options.save,
                ignore_digest: options.ignore_digest,
            };
            async move {
                let outcome = self.check_one(&request, observer).await;
                CheckResult { id, name, outcome }
            }
        });
        let results = join_all(checks).await;

        self.log.log("");
        notify(observer, CheckEvent::Done);

        let summary = CheckSummary { results };
        info!(
            trigger = %options.trigger,
            checked = summary.checked(),
            updated = summary.updated(),
            failed = summary.failed(),
            "update check finished"
        );
        Ok(summary)
    }

    /// Run a check-all for every trigger until the channel closes.
    pub async fn run_scheduled(&self, mut triggers: mpsc::UnboundedReceiver<()>) {
        while triggers.recv().await.is_some() {
            match self.check_all(CheckAllOptions::scheduled()).await {
                Ok(_) => {}
                Err(Error::CheckInProgress) => debug!("scheduled check skipped, one is already running"),
                Err(err) => warn!(error = %err, "scheduled check failed"),
            }
        }
    }

    async fn resolve(&self, target: &CheckTarget) -> Result<Style> {
        match target {
            CheckTarget::Style(style) => Ok(style.as_ref().clone()),
            CheckTarget::Id(id) => self
                .store
                .get_by_id(*id)
                .await?
                .ok_or(Error::StyleNotFound { id: *id }),
        }
    }

    /// True the first time an id asks for a retry in this run.
    fn claim_retry(&self, id: StyleId) -> bool {
        self.retried
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id)
    }

    fn clear_retries(&self) {
        self.retried
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    fn report(&self, style: &Style, outcome: &Outcome, observer: Option<&Observer>) {
        match outcome {
            Outcome::Updated(saved) => {
                self.log.log(format!("updated #{} {}", saved.id, saved.name));
                notify(observer, CheckEvent::Updated { style: saved.clone() });
            }
            Outcome::Preview(preview) => {
                self.log.log(format!("update available #{} {}", preview.id, preview.name));
                notify(observer, CheckEvent::Updated { style: preview.clone() });
            }
            Outcome::Skipped(reason) => {
                self.report_error(style, &reason.to_string(), Some(*reason), observer);
            }
        }
    }

    fn report_error(&self, style: &Style, error: &str, reason: Option<SkipReason>, observer: Option<&Observer>) {
        self.log.log(format!("skipped ({error}) #{} {}", style.id, style.name));
        notify(
            observer,
            CheckEvent::Error {
                error: error.to_string(),
                reason,
                style: Box::new(self.store.strip_code(style)),
            },
        );
    }
}

fn notify(observer: Option<&Observer>, event: CheckEvent) {
    if let Some(observer) = observer {
        // A closed observer must not disturb the checks
        let _ = observer.send(event);
    }
}
