//! In-memory [`StyleStore`]

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use style_core::{Error, Result, Style, StyleDocument, StyleId, StyleStore};

/// Which save operation was called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOp {
    Full,
    Versioned,
}

/// One recorded save
#[derive(Debug, Clone, PartialEq)]
pub struct SaveCall {
    pub op: SaveOp,
    pub doc: StyleDocument,
}

/// Style store keeping everything in a map and recording every save.
#[derive(Debug, Default)]
pub struct MemoryStore {
    styles: Mutex<BTreeMap<StyleId, Style>>,
    saves: Mutex<Vec<SaveCall>>,
}

impl MemoryStore {
    pub fn new(styles: impl IntoIterator<Item = Style>) -> Self {
        let store = Self::default();
        for style in styles {
            store.insert(style);
        }
        store
    }

    pub fn insert(&self, style: Style) {
        self.styles.lock().unwrap().insert(style.id, style);
    }

    /// Current stored copy, bypassing the async interface.
    pub fn get(&self, id: StyleId) -> Option<Style> {
        self.styles.lock().unwrap().get(&id).cloned()
    }

    pub fn saves(&self) -> Vec<SaveCall> {
        self.saves.lock().unwrap().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    fn merge(&self, op: SaveOp, doc: StyleDocument) -> Result<Style> {
        self.saves.lock().unwrap().push(SaveCall {
            op,
            doc: doc.clone(),
        });

        let id = doc.id.ok_or(Error::MissingStyleId)?;
        let mut styles = self.styles.lock().unwrap();
        let style = styles.get_mut(&id).ok_or(Error::StyleNotFound { id })?;
        style.apply(doc);
        Ok(style.clone())
    }
}

#[async_trait]
impl StyleStore for MemoryStore {
    async fn get_all(&self) -> Result<Vec<Style>> {
        Ok(self.styles.lock().unwrap().values().cloned().collect())
    }

    async fn get_by_id(&self, id: StyleId) -> Result<Option<Style>> {
        Ok(self.get(id))
    }

    async fn save_full(&self, doc: StyleDocument) -> Result<Style> {
        self.merge(SaveOp::Full, doc)
    }

    async fn save_versioned(&self, doc: StyleDocument) -> Result<Style> {
        if !doc.is_usercss() {
            return Err(Error::NotUsercss {
                id: doc.id.ok_or(Error::MissingStyleId)?,
            });
        }
        self.merge(SaveOp::Versioned, doc)
    }
}
