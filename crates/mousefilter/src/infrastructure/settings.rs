//! Live settings store.
//!
//! The filter thread reads a fresh [`FilterConfig`] snapshot for every motion
//! event; a background Tokio task re-reads the config file whenever its
//! modification time changes and swaps the new snapshot in.  Edits to the
//! file therefore take effect on the next mouse movement, with no restart.
//!
//! A file that fails to parse is logged and ignored; the previous settings
//! stay in force.

use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, PoisonError, RwLock,
};
use std::time::{Duration, SystemTime};

use mousefilter_core::FilterConfig;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::infrastructure::storage::config::load_config_from;

/// Shared, cheaply clonable handle to the current filter settings.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    inner: Arc<RwLock<FilterConfig>>,
}

impl SettingsStore {
    /// Creates a store holding `initial`.
    pub fn new(initial: FilterConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    /// Returns a copy of the current settings.
    pub fn snapshot(&self) -> FilterConfig {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the settings, returning `true` if they changed.
    pub fn replace(&self, config: FilterConfig) -> bool {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let changed = *guard != config;
        *guard = config;
        changed
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Re-reads `path` into `store` whenever the file's modification time
/// changes.  Runs until `running` is cleared.
pub fn spawn_reload_task(
    store: SettingsStore,
    path: PathBuf,
    interval: Duration,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_seen = modified(&path);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        while running.load(Ordering::Relaxed) {
            ticker.tick().await;

            let current = modified(&path);
            if current == last_seen {
                continue;
            }
            last_seen = current;

            match load_config_from(&path) {
                Ok(cfg) => {
                    let filter = cfg.filter.to_filter_config();
                    if store.replace(filter) {
                        info!(
                            smoothing = filter.smoothing,
                            show_indicator = filter.show_indicator,
                            "settings reloaded"
                        );
                    } else {
                        debug!("settings file touched; values unchanged");
                    }
                }
                Err(e) => warn!("keeping previous settings: {e}"),
            }
        }
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
