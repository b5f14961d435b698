use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use style_fs::io;

use super::STYLES_DIR;
use crate::collab::StyleStore;
use crate::model::{Style, StyleDocument, StyleId};
use crate::{Error, Result};

/// Style store keeping one pretty-printed JSON file per style
#[derive(Debug, Clone)]
pub struct JsonStyleStore {
    dir: PathBuf,
}

impl JsonStyleStore {
    /// Store rooted at `<data_dir>/styles`.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join(STYLES_DIR),
        }
    }

    fn path_for(&self, id: StyleId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Write a complete style, replacing any stored copy.
    pub fn put(&self, style: &Style) -> Result<()> {
        let json = serde_json::to_string_pretty(style)?;
        io::write_text(&self.path_for(style.id), &json)?;
        Ok(())
    }

    fn read(&self, id: StyleId) -> Result<Option<Style>> {
        match io::read_text_opt(&self.path_for(id))? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn merge(&self, doc: StyleDocument) -> Result<Style> {
        let id = doc.id.ok_or(Error::MissingStyleId)?;
        let mut style = self.read(id)?.ok_or(Error::StyleNotFound { id })?;
        style.apply(doc);
        self.put(&style)?;
        tracing::debug!(%id, "style saved");
        Ok(style)
    }
}

#[async_trait]
impl StyleStore for JsonStyleStore {
    async fn get_all(&self) -> Result<Vec<Style>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut styles = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let text = io::read_text(&path)?;
            match serde_json::from_str::<Style>(&text) {
                Ok(style) => styles.push(style),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable style file");
                }
            }
        }
        styles.sort_by_key(|style| style.id);
        Ok(styles)
    }

    async fn get_by_id(&self, id: StyleId) -> Result<Option<Style>> {
        self.read(id)
    }

    async fn save_full(&self, doc: StyleDocument) -> Result<Style> {
        self.merge(doc)
    }

    async fn save_versioned(&self, doc: StyleDocument) -> Result<Style> {
        if !doc.is_usercss() {
            return Err(Error::NotUsercss {
                id: doc.id.ok_or(Error::MissingStyleId)?,
            });
        }
        self.merge(doc)
    }
}
