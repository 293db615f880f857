use std::fs::{self, OpenOptions};
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable that turns on file logging and sets its filter.
pub const LOG_ENV: &str = "KEYPACE_LOG";

/// Keeps the background log writer alive; logs flush when dropped.
pub struct LogGuard {
    _guard: WorkerGuard,
}

/// Whether logging was requested through the environment.
pub fn requested_by_env() -> bool {
    std::env::var_os(LOG_ENV).is_some()
}

/// Route `tracing` output to `path`. The terminal belongs to the TUI, so
/// nothing is ever written to stdout or stderr.
pub fn init_file_logging(path: &Path) -> crate::Result<LogGuard> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("keypace=debug"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    // a subscriber may already be installed (tests); keep the first one
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init();

    Ok(LogGuard { _guard: guard })
}
