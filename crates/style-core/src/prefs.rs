//! Runtime preferences with change notification

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::config::UpdaterConfig;

/// Preference values the updater reacts to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpdatePrefs {
    /// Hours between scheduled checks; `0` disables scheduling.
    pub interval_hours: f64,
}

impl Default for UpdatePrefs {
    fn default() -> Self {
        Self { interval_hours: 24.0 }
    }
}

impl From<&UpdaterConfig> for UpdatePrefs {
    fn from(config: &UpdaterConfig) -> Self {
        Self {
            interval_hours: config.interval_hours,
        }
    }
}

/// Shared preference cell; subscribers see every change.
#[derive(Debug, Clone)]
pub struct Preferences {
    tx: watch::Sender<UpdatePrefs>,
}

impl Preferences {
    pub fn new(initial: UpdatePrefs) -> Self {
        Self {
            tx: watch::Sender::new(initial),
        }
    }

    pub fn get(&self) -> UpdatePrefs {
        *self.tx.borrow()
    }

    pub fn interval_hours(&self) -> f64 {
        self.get().interval_hours
    }

    /// Update the interval; subscribers are notified only on a real change.
    pub fn set_interval_hours(&self, hours: f64) {
        self.tx.send_if_modified(|prefs| {
            if prefs.interval_hours == hours {
                return false;
            }
            prefs.interval_hours = hours;
            true
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<UpdatePrefs> {
        self.tx.subscribe()
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::new(UpdatePrefs::default())
    }
}
