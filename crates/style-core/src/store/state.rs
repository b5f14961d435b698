use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use style_fs::io;

use super::{LAST_CHECK_FILE, StateStore};
use crate::Result;

/// Last-check time kept as a single RFC 3339 line
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(LAST_CHECK_FILE),
        }
    }
}

impl StateStore for JsonStateStore {
    fn load_last_check(&self) -> Result<Option<DateTime<Utc>>> {
        let Some(text) = io::read_text_opt(&self.path)? else {
            return Ok(None);
        };
        match DateTime::parse_from_rfc3339(text.trim()) {
            Ok(at) => Ok(Some(at.with_timezone(&Utc))),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "ignoring corrupt last-check file");
                Ok(None)
            }
        }
    }

    fn save_last_check(&self, at: DateTime<Utc>) -> Result<()> {
        io::write_text(&self.path, &format!("{}\n", at.to_rfc3339()))?;
        Ok(())
    }
}
