use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "chimptype.log";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Sends tracing output to `<dir>/chimptype.log`; the terminal belongs to
/// the UI. `RUST_LOG` overrides `level` when set.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init(dir: &Path, level: &str) -> Option<WorkerGuard> {
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("logging disabled, cannot create {}: {}", dir.display(), err);
        return None;
    }

    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_to_the_log_file() {
        let dir = tempdir().unwrap();
        let guard = init(dir.path(), "debug");
        assert!(guard.is_some());

        tracing::info!("hello from the test");
        drop(guard);

        let contents = std::fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap();
        assert!(contents.contains("hello from the test"));
    }
}
