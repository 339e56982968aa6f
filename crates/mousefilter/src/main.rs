//! MouseFilter daemon entry point.
//!
//! Wires an input source, a cursor controller, the live settings store and
//! the idle indicator around the smoothing engine, then runs until Ctrl-C.
//!
//! # Usage
//!
//! ```text
//! mousefilter [OPTIONS]
//!
//! Options:
//!   --config <PATH>  Settings file [default: <config dir>/mousefilter/config.toml]
//!   --disabled       Start with smoothing off (toggle with the hotkey)
//!   --mock           Headless run with a synthetic pointer and in-memory cursor
//! ```
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config             -- writes defaults on first run
//!  └─ start services
//!       ├─ settings reload     (Tokio task, polls the file mtime)
//!       ├─ InputSource         (X11 polling thread, or synthetic motion)
//!       └─ FilterInputUseCase  (filter thread, owns the engine and cursor)
//! ```

use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{Receiver, RecvTimeoutError},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use mousefilter_core::{CursorHost, DisplayBounds, Point};
use tracing::{debug, info, trace, warn};
use tracing_subscriber::EnvFilter;

use mousefilter::application::filter_input::{Disposition, FilterInputUseCase};
use mousefilter::application::indicator::{IdleIndicator, LogIndicatorSink};
use mousefilter::infrastructure::clock::MonotonicClock;
use mousefilter::infrastructure::cursor::MockCursor;
use mousefilter::infrastructure::input_capture::{
    mock::{spawn_synthetic_motion, MockInputSource},
    InputSource, Key, RawInputEvent,
};
use mousefilter::infrastructure::pointer_track::{self, SharedPointerTrack};
use mousefilter::infrastructure::settings::{spawn_reload_task, SettingsStore};
use mousefilter::infrastructure::storage::config::{
    config_file_path, load_config_from, save_config_to, AppConfig,
};

/// Frame period of the synthetic pointer in `--mock` mode.
const MOCK_FRAME: Duration = Duration::from_millis(8);

/// Display size and starting point of the in-memory cursor.
const MOCK_BOUNDS: DisplayBounds = DisplayBounds::from_size(1920.0, 1080.0);
const MOCK_START: Point = Point::new(960.0, 540.0);

/// How long the filter thread blocks before re-checking the shutdown flag.
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Real-time pointer smoothing daemon.
#[derive(Debug, Parser)]
#[command(
    name = "mousefilter",
    about = "Smooths pointer motion in real time by steering the system cursor",
    version
)]
struct Cli {
    /// Path of the TOML settings file.
    ///
    /// Created with default values if it does not exist.  Edits are picked up
    /// while the daemon runs.
    #[arg(long, value_name = "PATH", env = "MOUSEFILTER_CONFIG")]
    config: Option<PathBuf>,

    /// Start with smoothing disabled, overriding `start_enabled`.
    #[arg(long)]
    disabled: bool,

    /// Use a synthetic pointer and an in-memory cursor instead of the
    /// display server.
    #[arg(long)]
    mock: bool,
}

impl Cli {
    /// Resolves the settings path, falling back to the platform config dir.
    fn config_path(&self) -> anyhow::Result<PathBuf> {
        match &self.config {
            Some(path) => Ok(path.clone()),
            None => config_file_path().context("pass --config to choose a settings file"),
        }
    }
}

// ── Backends ──────────────────────────────────────────────────────────────────

/// The OS-facing half of the pipeline.
struct Backend {
    source: Arc<dyn InputSource>,
    cursor: Box<dyn CursorHost + Send>,
    /// Present in `--mock` mode: the source and track the synthetic pointer
    /// drives once the source is started.
    synthetic: Option<(Arc<MockInputSource>, SharedPointerTrack)>,
}

fn mock_backend(clock: MonotonicClock) -> Backend {
    let track = pointer_track::shared(MOCK_START);
    let cursor = MockCursor::with_track(Arc::clone(&track), MOCK_BOUNDS, clock);
    let source = Arc::new(MockInputSource::new());
    Backend {
        source: Arc::clone(&source) as Arc<dyn InputSource>,
        cursor: Box::new(cursor),
        synthetic: Some((source, track)),
    }
}

#[cfg(target_os = "linux")]
fn native_backend(clock: MonotonicClock) -> anyhow::Result<Backend> {
    use mousefilter::infrastructure::cursor::linux::X11Cursor;
    use mousefilter::infrastructure::input_capture::linux::X11InputSource;

    /// Pointer polling period; roughly a 250 Hz sample rate.
    const X11_POLL_INTERVAL: Duration = Duration::from_millis(4);

    let track = pointer_track::shared(Point::default());
    let cursor = X11Cursor::open(Arc::clone(&track), clock)
        .context("failed to open the X11 display (use --mock for a headless run)")?;
    let source = X11InputSource::new(track, clock, X11_POLL_INTERVAL);
    Ok(Backend {
        source: Arc::new(source),
        cursor: Box::new(cursor),
        synthetic: None,
    })
}

#[cfg(not(target_os = "linux"))]
fn native_backend(_clock: MonotonicClock) -> anyhow::Result<Backend> {
    use mousefilter::infrastructure::input_capture::CaptureError;

    Err(CaptureError::UnsupportedPlatform(std::env::consts::OS.to_string()))
        .context("no native input backend (use --mock for a headless run)")
}

// ── Startup helpers ───────────────────────────────────────────────────────────

/// Loads the settings file, writing defaults first if it is missing.
///
/// Returns the config and whether the file had to be created.
fn load_or_create_config(path: &Path) -> anyhow::Result<(AppConfig, bool)> {
    let existed = path.exists();
    let config = load_config_from(path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    if !existed {
        save_config_to(path, &config)
            .with_context(|| format!("failed to write default settings to {}", path.display()))?;
    }
    Ok((config, !existed))
}

/// Runs events through the use case until shutdown or until the source
/// disconnects.  Smoothing is switched off on the way out so the cursor is
/// re-coupled to the hardware.
fn run_filter_loop(
    mut use_case: FilterInputUseCase,
    events: Receiver<RawInputEvent>,
    running: Arc<AtomicBool>,
) {
    let mut forwarded = 0u64;
    let mut dropped = 0u64;

    while running.load(Ordering::Relaxed) {
        let event = match events.recv_timeout(RECV_TIMEOUT) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                info!("input source closed");
                break;
            }
        };

        match use_case.handle(event) {
            Ok(Disposition::Forward(event)) => {
                forwarded += 1;
                trace!(?event, "forward");
            }
            Ok(Disposition::Consumed) => debug!("event consumed"),
            Err(e) => {
                dropped += 1;
                warn!("dropping event: {e}");
            }
        }
    }

    use_case.set_enabled(false);
    info!(forwarded, dropped, "filter loop stopped");
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config_path()?;
    let (config, created) = load_or_create_config(&config_path)?;

    // Level is overridden by `RUST_LOG`.
    let log_level = config.daemon.log_level.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .init();

    info!("MouseFilter starting");
    if created {
        info!("wrote default settings to {}", config_path.display());
    }

    let hotkey: Key = config
        .daemon
        .toggle_hotkey
        .parse()
        .context("invalid toggle_hotkey in settings")?;
    let settings = SettingsStore::new(config.filter.to_filter_config());

    // Shutdown flag shared across all background services.
    let running = Arc::new(AtomicBool::new(true));

    // ── Ctrl-C / SIGTERM handler ──────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown signal received");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl-C signal: {e}"),
        }
    });

    // ── Settings reload ───────────────────────────────────────────────────────
    let reload = spawn_reload_task(
        settings.clone(),
        config_path.clone(),
        config.daemon.settings_poll_interval(),
        Arc::clone(&running),
    );

    // ── Input source and cursor ───────────────────────────────────────────────
    let clock = MonotonicClock::new();
    let backend = if cli.mock {
        info!("mock mode: synthetic pointer, in-memory cursor");
        mock_backend(clock)
    } else {
        native_backend(clock)?
    };

    let events = backend
        .source
        .start()
        .context("failed to start input capture")?;

    let synthetic = backend.synthetic.map(|(source, track)| {
        spawn_synthetic_motion(source, track, clock, MOCK_FRAME, Arc::clone(&running))
    });

    // ── Filter thread ─────────────────────────────────────────────────────────
    let indicator = IdleIndicator::new(
        Arc::new(LogIndicatorSink),
        tokio::runtime::Handle::current(),
    );
    let mut use_case = FilterInputUseCase::new(backend.cursor, settings, hotkey, Some(indicator));
    use_case.set_enabled(config.daemon.start_enabled && !cli.disabled);

    let filter_running = Arc::clone(&running);
    let filter = std::thread::Builder::new()
        .name("mousefilter-filter".to_string())
        .spawn(move || run_filter_loop(use_case, events, filter_running))
        .context("failed to spawn filter thread")?;

    info!(%hotkey, "MouseFilter ready.  Press the hotkey to toggle, Ctrl-C to exit.");

    while running.load(Ordering::Relaxed) && !filter.is_finished() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────
    running.store(false, Ordering::Relaxed);
    backend.source.stop();
    if filter.join().is_err() {
        warn!("filter thread panicked");
    }
    if let Some(handle) = synthetic {
        if handle.join().is_err() {
            warn!("synthetic motion thread panicked");
        }
    }
    if let Err(e) = reload.await {
        warn!("settings reload task failed: {e}");
    }

    info!("MouseFilter stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
