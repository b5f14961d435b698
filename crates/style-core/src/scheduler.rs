//! Periodic check scheduling
//!
//! The scheduler owns a single pending timer. Re-arming aborts the previous
//! timer, so only the most recent trigger can fire. Fired triggers are
//! delivered over an unbounded channel to whoever runs the checks.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::Result;
use crate::prefs::UpdatePrefs;
use crate::store::StateStore;

/// Delay until the next check, or `None` when scheduling is disabled.
///
/// The remaining time is `interval - elapsed`, but never less than `floor`.
pub fn next_check_delay(interval: Duration, elapsed: Duration, floor: Duration) -> Option<Duration> {
    if interval.is_zero() {
        return None;
    }
    Some(interval.saturating_sub(elapsed).max(floor))
}

/// Convert an hours preference to a duration; non-positive values disable.
pub fn interval_from_hours(hours: f64) -> Duration {
    Duration::try_from_secs_f64(hours * 3600.0).unwrap_or(Duration::ZERO)
}

struct SchedulerState {
    interval: Duration,
    last_check: DateTime<Utc>,
    pending: Option<JoinHandle<()>>,
}

/// Arms check triggers from an interval and the time of the last check
pub struct Scheduler {
    state: Mutex<SchedulerState>,
    floor: Duration,
    triggers: mpsc::UnboundedSender<()>,
    state_store: Option<Arc<dyn StateStore>>,
}

impl Scheduler {
    /// Create a disarmed scheduler and the receiving end of its triggers.
    ///
    /// The last check starts at "now".
    pub fn new(floor: Duration) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (triggers, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            state: Mutex::new(SchedulerState {
                interval: Duration::ZERO,
                last_check: Utc::now(),
                pending: None,
            }),
            floor,
            triggers,
            state_store: None,
        };
        (scheduler, rx)
    }

    /// Persist the last-check time through `store`, restoring it if one was saved.
    ///
    /// A store with no recorded time is seeded with the current one.
    pub fn with_state_store(mut self, store: Arc<dyn StateStore>) -> Result<Self> {
        match store.load_last_check()? {
            Some(at) => self.lock().last_check = at,
            None => store.save_last_check(self.last_check())?,
        }
        self.state_store = Some(store);
        Ok(self)
    }

    pub fn last_check(&self) -> DateTime<Utc> {
        self.lock().last_check
    }

    pub fn interval(&self) -> Duration {
        self.lock().interval
    }

    /// Whether a trigger is currently armed.
    pub fn is_armed(&self) -> bool {
        self.lock()
            .pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Change the interval and re-arm; `0` cancels any pending trigger.
    pub fn set_interval_hours(&self, hours: f64) {
        self.lock().interval = interval_from_hours(hours);
        self.schedule();
    }

    /// Record a check as starting now and re-arm for the next one.
    pub fn reset_interval(&self) {
        let now = Utc::now();
        self.lock().last_check = now;
        if let Some(store) = &self.state_store {
            if let Err(err) = store.save_last_check(now) {
                warn!(error = %err, "failed to persist last check time");
            }
        }
        self.schedule();
    }

    /// Arm the next trigger from the current interval and elapsed time.
    ///
    /// Outside a tokio runtime nothing is armed.
    pub fn schedule(&self) {
        let mut state = self.lock();
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }

        let elapsed = (Utc::now() - state.last_check).to_std().unwrap_or_default();
        let Some(delay) = next_check_delay(state.interval, elapsed, self.floor) else {
            debug!("scheduled checks disabled");
            return;
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime, next check not armed");
            return;
        };
        debug!(delay_secs = delay.as_secs(), "next check armed");
        let triggers = self.triggers.clone();
        state.pending = Some(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver may be gone during shutdown
            let _ = triggers.send(());
        }));
    }

    pub fn cancel(&self) {
        if let Some(pending) = self.lock().pending.take() {
            pending.abort();
        }
    }

    /// Follow interval changes from the preferences until they are dropped.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn follow(self: &Arc<Self>, mut prefs: watch::Receiver<UpdatePrefs>) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            while prefs.changed().await.is_ok() {
                let hours = prefs.borrow_and_update().interval_hours;
                debug!(hours, "interval preference changed");
                scheduler.set_interval_hours(hours);
            }
        })
    }

    fn lock(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FLOOR: Duration = Duration::from_secs(10);

    #[rstest]
    #[case::fresh(3600, 0, Some(3600))]
    #[case::partly_elapsed(3600, 600, Some(3000))]
    #[case::overdue(3600, 7200, Some(10))]
    #[case::near_due(3600, 3595, Some(10))]
    #[case::disabled(0, 0, None)]
    fn delay_from_interval(#[case] interval: u64, #[case] elapsed: u64, #[case] expected: Option<u64>) {
        let delay = next_check_delay(
            Duration::from_secs(interval),
            Duration::from_secs(elapsed),
            FLOOR,
        );
        assert_eq!(delay, expected.map(Duration::from_secs));
    }

    #[rstest]
    #[case(24.0, 86_400)]
    #[case(0.5, 1_800)]
    #[case(0.0, 0)]
    #[case(-1.0, 0)]
    fn hours_to_interval(#[case] hours: f64, #[case] secs: u64) {
        assert_eq!(interval_from_hours(hours), Duration::from_secs(secs));
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_keeps_only_latest_trigger() {
        let (scheduler, mut rx) = Scheduler::new(FLOOR);
        scheduler.set_interval_hours(1.0);
        scheduler.schedule();
        scheduler.schedule();

        tokio::time::sleep(Duration::from_secs(3601)).await;
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_cancels_pending() {
        let (scheduler, mut rx) = Scheduler::new(FLOOR);
        scheduler.set_interval_hours(1.0);
        assert!(scheduler.is_armed());

        scheduler.set_interval_hours(0.0);
        assert!(!scheduler.is_armed());

        tokio::time::sleep(Duration::from_secs(7200)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn scheduling_without_runtime_stays_disarmed() {
        let (scheduler, _rx) = Scheduler::new(FLOOR);
        scheduler.set_interval_hours(1.0);
        scheduler.reset_interval();
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_interval_moves_last_check() {
        let (scheduler, _rx) = Scheduler::new(FLOOR);
        scheduler.set_interval_hours(1.0);
        let stale = Utc::now() - chrono::Duration::hours(2);
        scheduler.lock().last_check = stale;

        scheduler.reset_interval();

        assert!(scheduler.last_check() > stale);
        assert!(scheduler.is_armed());
    }
}
