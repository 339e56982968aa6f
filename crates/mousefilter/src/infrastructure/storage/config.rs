//! TOML-based configuration persistence for the daemon.
//!
//! Reads and writes [`AppConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\MouseFilter\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/mousefilter/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/MouseFilter/config.toml`
//!
//! A different file can be selected with `--config`; the `*_from` / `*_to`
//! functions take an explicit path for that case.
//!
//! # File layout
//!
//! ```toml
//! [daemon]
//! log_level = "info"
//! toggle_hotkey = "F12"
//! start_enabled = true
//! settings_poll_ms = 1000
//!
//! [filter]
//! smoothing = 0.75
//! show_indicator = true
//! idle_floor_ms = 200
//! rubberband_radius_per_unit = 800.0
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "...")]`, and both sections are
//! optional.  An empty file, a file from an older version, or no file at all
//! all produce a working configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mousefilter_core::{FilterConfig, TuningPolicy, DEFAULT_SMOOTHING};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub filter: FilterSettings,
}

/// Process-level behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Key that toggles smoothing, `"F1"`..`"F35"`.
    #[serde(default = "default_hotkey")]
    pub toggle_hotkey: String,
    /// Whether smoothing is on at launch.
    #[serde(default = "default_true")]
    pub start_enabled: bool,
    /// How often the settings file is checked for changes.
    #[serde(default = "default_settings_poll_ms")]
    pub settings_poll_ms: u64,
}

/// Smoothing parameters, re-read while the daemon runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterSettings {
    /// Smoothing strength in `[0, 0.99]`; out-of-range values are clamped.
    #[serde(default = "default_smoothing")]
    pub smoothing: f64,
    /// Whether the idle indicator follows the synthesized position.
    #[serde(default = "default_true")]
    pub show_indicator: bool,
    /// Lower bound of the idle timeout in milliseconds.
    #[serde(default = "default_idle_floor_ms")]
    pub idle_floor_ms: u64,
    /// Rubber-band radius per unit of smoothing, in pixels.
    #[serde(default = "default_radius_per_unit")]
    pub rubberband_radius_per_unit: f64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_hotkey() -> String {
    "F12".to_string()
}
fn default_true() -> bool {
    true
}
fn default_settings_poll_ms() -> u64 {
    1000
}
fn default_smoothing() -> f64 {
    DEFAULT_SMOOTHING
}
fn default_idle_floor_ms() -> u64 {
    200
}
fn default_radius_per_unit() -> f64 {
    800.0
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            toggle_hotkey: default_hotkey(),
            start_enabled: default_true(),
            settings_poll_ms: default_settings_poll_ms(),
        }
    }
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            smoothing: default_smoothing(),
            show_indicator: default_true(),
            idle_floor_ms: default_idle_floor_ms(),
            rubberband_radius_per_unit: default_radius_per_unit(),
        }
    }
}

impl FilterSettings {
    /// Converts the on-disk settings into the engine's config snapshot.
    ///
    /// Values are clamped into their valid ranges.
    pub fn to_filter_config(&self) -> FilterConfig {
        FilterConfig {
            smoothing: self.smoothing,
            show_indicator: self.show_indicator,
            policy: TuningPolicy {
                idle_floor: Duration::from_millis(self.idle_floor_ms),
                radius_per_unit: self.rubberband_radius_per_unit,
            },
        }
        .sanitized()
    }
}

impl DaemonConfig {
    /// Settings poll interval, never shorter than 50 ms.
    pub fn settings_poll_interval(&self) -> Duration {
        Duration::from_millis(self.settings_poll_ms.max(50))
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads [`AppConfig`] from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("MouseFilter"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("mousefilter"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("MouseFilter")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
