//! In-memory [`LogStore`]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use style_core::{LogDocument, LogStore, Result};

/// Log store starting with no prior state.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    doc: Mutex<Option<LogDocument>>,
    writes: AtomicUsize,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persisted lines; empty if nothing was written.
    pub fn lines(&self) -> Vec<String> {
        self.doc
            .lock()
            .unwrap()
            .as_ref()
            .map(|doc| doc.lines.clone())
            .unwrap_or_default()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn read_log(&self) -> Result<Option<LogDocument>> {
        Ok(self.doc.lock().unwrap().clone())
    }

    async fn write_log(&self, doc: &LogDocument) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.doc.lock().unwrap() = Some(doc.clone());
        Ok(())
    }
}
