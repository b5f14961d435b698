//! Rolling, user-facing log of update check outcomes
//!
//! Lines queue in memory and are flushed in batches to a [`LogStore`].
//! A batch written more than `timestamp_gap` after the previous flush gets
//! a timestamp prefix on its first line; consecutive blank separators
//! collapse; the persisted log keeps only the newest `max_lines` lines.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::Instant;

use crate::Result;
use crate::collab::{LogDocument, LogStore};
use crate::config::LogSettings;

#[derive(Debug, Clone)]
struct QueuedLine {
    text: String,
    time: DateTime<Local>,
}

#[derive(Default)]
struct LogState {
    queue: Vec<QueuedLine>,
    last_write: Option<Instant>,
}

struct LogInner {
    store: Arc<dyn LogStore>,
    settings: LogSettings,
    state: Mutex<LogState>,
    /// Serializes flushes so a batch is never interleaved with another.
    flush_lock: tokio::sync::Mutex<()>,
    /// Bumped on every append; a debounced flush only runs if it is still current.
    generation: AtomicU64,
    batching: AtomicBool,
}

/// Activity log handle; clones share the same queue.
#[derive(Clone)]
pub struct ActivityLog {
    inner: Arc<LogInner>,
}

impl ActivityLog {
    pub fn new(store: Arc<dyn LogStore>, settings: LogSettings) -> Self {
        Self {
            inner: Arc::new(LogInner {
                store,
                settings,
                state: Mutex::new(LogState::default()),
                flush_lock: tokio::sync::Mutex::new(()),
                generation: AtomicU64::new(0),
                batching: AtomicBool::new(false),
            }),
        }
    }

    /// While batching, flushes are debounced by `debounce`; otherwise they
    /// run as soon as the runtime gets to them.
    pub fn set_batching(&self, batching: bool) {
        self.inner.batching.store(batching, Ordering::SeqCst);
    }

    /// Queue a line and schedule a debounced flush.
    ///
    /// An empty string is a separator.
    pub fn log(&self, text: impl Into<String>) {
        self.push(text.into());

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = if self.inner.batching.load(Ordering::SeqCst) {
            self.inner.settings.debounce()
        } else {
            Duration::ZERO
        };

        // Without a runtime the line stays queued until an explicit flush
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let log = self.clone();
        handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if log.inner.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            if let Err(err) = log.flush().await {
                tracing::warn!(error = %err, "activity log flush failed");
            }
        });
    }

    fn push(&self, text: String) {
        let mut state = lock(&self.inner.state);
        state.queue.push(QueuedLine {
            text,
            time: Local::now(),
        });
    }

    /// Number of lines waiting for a flush.
    pub fn pending(&self) -> usize {
        lock(&self.inner.state).queue.len()
    }

    /// Write all queued lines to the store.
    ///
    /// On failure the batch is put back at the front of the queue.
    pub async fn flush(&self) -> Result<()> {
        let _flushing = self.inner.flush_lock.lock().await;

        let (batch, last_write) = {
            let mut state = lock(&self.inner.state);
            (std::mem::take(&mut state.queue), state.last_write)
        };
        if batch.is_empty() {
            return Ok(());
        }

        match self.write_batch(&batch, last_write).await {
            Ok(()) => {
                lock(&self.inner.state).last_write = Some(Instant::now());
                Ok(())
            }
            Err(err) => {
                let mut state = lock(&self.inner.state);
                let newer = std::mem::replace(&mut state.queue, batch);
                state.queue.extend(newer);
                Err(err)
            }
        }
    }

    async fn write_batch(&self, batch: &[QueuedLine], last_write: Option<Instant>) -> Result<()> {
        let mut lines = self
            .inner
            .store
            .read_log()
            .await?
            .map(|doc| doc.lines)
            .unwrap_or_default();

        let fresh = last_write.is_none_or(|t| t.elapsed() > self.inner.settings.timestamp_gap());
        let mut stamp = fresh
            .then(|| batch.iter().find(|line| !line.text.is_empty()))
            .flatten()
            .map(|line| format!("{} ", line.time.format(TIMESTAMP_FORMAT)));

        for line in batch {
            if line.text.is_empty() {
                if lines.last().is_some_and(|last| !last.is_empty()) {
                    lines.push(String::new());
                }
                continue;
            }
            match stamp.take() {
                Some(prefix) => lines.push(format!("{prefix}{}", line.text)),
                None => lines.push(line.text.clone()),
            }
        }

        let max = self.inner.settings.max_lines;
        if lines.len() > max {
            lines.drain(..lines.len() - max);
        }

        self.inner.store.write_log(&LogDocument { lines }).await
    }
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn lock(state: &Mutex<LogState>) -> std::sync::MutexGuard<'_, LogState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct VecLog {
        doc: Mutex<Option<LogDocument>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl LogStore for VecLog {
        async fn read_log(&self) -> Result<Option<LogDocument>> {
            Ok(self.doc.lock().unwrap().clone())
        }

        async fn write_log(&self, doc: &LogDocument) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(std::io::Error::other("disk full").into());
            }
            *self.doc.lock().unwrap() = Some(doc.clone());
            Ok(())
        }
    }

    fn lines(store: &VecLog) -> Vec<String> {
        store.doc.lock().unwrap().clone().unwrap_or_default().lines
    }

    fn setup(max_lines: usize) -> (Arc<VecLog>, ActivityLog) {
        let store = Arc::new(VecLog::default());
        let settings = LogSettings {
            max_lines,
            ..Default::default()
        };
        (store.clone(), ActivityLog::new(store, settings))
    }

    fn has_timestamp(line: &str) -> bool {
        // "YYYY-MM-DD HH:MM:SS "
        line.len() > 20 && line.as_bytes()[4] == b'-' && line.as_bytes()[19] == b' '
    }

    #[test]
    fn lines_queue_without_runtime() {
        let (_, log) = setup(10);
        log.log("a");
        log.log("b");
        assert_eq!(log.pending(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn first_batch_is_timestamped_once() {
        let (store, log) = setup(10);
        log.push("updated #1 A".into());
        log.push("updated #2 B".into());
        log.flush().await.unwrap();

        let written = lines(&store);
        assert!(has_timestamp(&written[0]));
        assert!(written[0].ends_with("updated #1 A"));
        assert_eq!(written[1], "updated #2 B");
    }

    #[tokio::test(start_paused = true)]
    async fn batches_within_gap_share_timestamp() {
        let (store, log) = setup(10);
        log.push("one".into());
        log.flush().await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        log.push("two".into());
        log.flush().await.unwrap();

        tokio::time::advance(Duration::from_secs(12)).await;
        log.push("three".into());
        log.flush().await.unwrap();

        let written = lines(&store);
        assert_eq!(written[1], "two");
        assert!(has_timestamp(&written[2]));
    }

    #[tokio::test]
    async fn blank_separators_collapse() {
        let (store, log) = setup(10);
        for text in ["", "", "start", "", "", "end", ""] {
            log.push(text.into());
        }
        log.flush().await.unwrap();
        log.push(String::new());
        log.flush().await.unwrap();

        let written = lines(&store);
        assert!(written[0].ends_with("start"));
        assert_eq!(&written[1..], &["", "end", ""]);
    }

    #[tokio::test]
    async fn log_is_capped_to_newest_lines() {
        let (store, log) = setup(3);
        for i in 0..5 {
            log.push(format!("line {i}"));
        }
        log.flush().await.unwrap();

        let written = lines(&store);
        assert_eq!(written.len(), 3);
        assert_eq!(&written[1..], &["line 3", "line 4"]);
        assert!(written[0].ends_with("line 2"));
    }

    #[tokio::test]
    async fn failed_flush_requeues_batch() {
        let (store, log) = setup(10);
        store.fail.store(true, Ordering::SeqCst);
        log.push("kept".into());

        assert!(log.flush().await.is_err());
        assert_eq!(log.pending(), 1);

        store.fail.store(false, Ordering::SeqCst);
        log.flush().await.unwrap();
        assert_eq!(log.pending(), 0);
        assert_eq!(lines(&store).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn batching_debounces_flush() {
        let (store, log) = setup(10);
        log.set_batching(true);
        log.log("a");
        tokio::time::sleep(Duration::from_millis(500)).await;
        log.log("b");
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(lines(&store).is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(lines(&store).len(), 2);
    }
}
