use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive, e.g. `quizring=debug`.
pub const LOG_ENV: &str = "QUIZRING_LOG";

/// Keeps the background writer alive; drop it to flush.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Route traces to a daily-rotated file under `log_dir`. The terminal belongs
/// to the UI, so nothing is ever written to stdout. Returns `None` when the
/// directory cannot be created or a subscriber is already installed.
pub fn init(log_dir: Option<&Path>) -> Option<FileLogGuard> {
    let log_dir = log_dir?;
    if let Err(err) = std::fs::create_dir_all(log_dir) {
        eprintln!("failed to create log directory {}: {err}", log_dir.display());
        return None;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "quizring.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .try_init()
        .ok()?;

    Some(FileLogGuard { _guard: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_dir_means_no_logging() {
        assert!(init(None).is_none());
    }

    #[test]
    fn writes_into_requested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        let guard = init(Some(&logs));
        assert!(logs.is_dir());
        drop(guard);
    }
}
