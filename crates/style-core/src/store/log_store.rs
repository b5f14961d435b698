use std::path::{Path, PathBuf};

use async_trait::async_trait;
use style_fs::io;

use super::LOG_FILE;
use crate::Result;
use crate::collab::{LogDocument, LogStore};

/// Activity log persisted as `{"lines": [...]}`
#[derive(Debug, Clone)]
pub struct JsonLogStore {
    path: PathBuf,
}

impl JsonLogStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(LOG_FILE),
        }
    }
}

#[async_trait]
impl LogStore for JsonLogStore {
    async fn read_log(&self) -> Result<Option<LogDocument>> {
        match io::read_text_opt(&self.path)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn write_log(&self, doc: &LogDocument) -> Result<()> {
        let json = serde_json::to_string_pretty(doc)?;
        io::write_text(&self.path, &json)?;
        Ok(())
    }
}
