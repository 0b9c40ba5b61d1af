use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Keeps the non-blocking file writer alive. Dropping it flushes and
/// closes the log file.
pub struct LogGuard {
    _worker: WorkerGuard,
}

/// Install the global subscriber: a stdout layer plus a daily-rolling
/// file in `log_dir`, filtered by `RUST_LOG` with an `info` fallback.
///
/// Call once at process start and hold the returned guard for the
/// process lifetime.
pub fn init(log_dir: &Path) -> LogGuard {
    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::daily(log_dir, "docfuse.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    LogGuard { _worker: guard }
}
