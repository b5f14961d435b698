//! Runtime context shared by the commands
//!
//! Resolves the configuration and wires the file-backed stores, the HTTP
//! fetcher and the activity log into a check orchestrator.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use style_core::{
    ActivityLog, CheckOrchestrator, HttpFetcher, JsonLogStore, JsonStyleStore, MetaBuilder,
    UpdaterConfig,
};

use crate::error::Result;

pub struct AppContext {
    pub config: UpdaterConfig,
    /// Data directory resolved against the working directory
    pub data_dir: PathBuf,
    pub styles: Arc<JsonStyleStore>,
    pub logs: Arc<JsonLogStore>,
}

impl AppContext {
    /// Load the config from `config_path`, or discover one in `cwd`.
    pub fn load(cwd: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => UpdaterConfig::load(path)?,
            None => UpdaterConfig::discover(cwd)?,
        };
        let data_dir = cwd.join(&config.data_dir);
        tracing::debug!(data_dir = %data_dir.display(), "resolved data directory");

        Ok(Self {
            styles: Arc::new(JsonStyleStore::new(&data_dir)),
            logs: Arc::new(JsonLogStore::new(&data_dir)),
            data_dir,
            config,
        })
    }

    pub fn orchestrator(&self) -> Result<CheckOrchestrator> {
        let fetcher = HttpFetcher::new(&self.config.http)?;
        let log = ActivityLog::new(self.logs.clone(), self.config.log.clone());
        Ok(CheckOrchestrator::new(
            self.styles.clone(),
            Arc::new(fetcher),
            Arc::new(MetaBuilder),
            log,
        )
        .with_retry_delay(self.config.retry_delay()))
    }
}
