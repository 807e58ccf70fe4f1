//! # Logging Initialization
//!
//! Centralized `tracing` setup for the `seatbelt_exec` binary and tests.
//!
//! - **Environment filter**: `RUST_LOG` wins when set; otherwise the given level applies to
//!   everything and `seatbelt_exec` itself logs at `debug`, which includes the compiled policy
//!   of every sandboxed run.
//! - **File logging**: with `log_to_file = true`, logs go to a daily rolling file in the user
//!   cache directory (from the `directories` crate) via `tracing_appender`, without ANSI colors.
//! - **Stderr logging**: with `log_to_file = false`, or when the cache directory is missing or
//!   not writable, logs go to stderr with colors.
//!
//! Initialization runs at most once per process.

use anyhow::Result;
use directories::ProjectDirs;
use std::{io::stderr, path::Path, sync::Once};
use tracing_subscriber::{EnvFilter, fmt::layer, prelude::*};

static INIT: Once = Once::new();

/// Initialize verbose logging for tests.
pub fn init_test_logging() {
    let _ = init_logging("trace", false);
}

/// Initializes the global tracing subscriber.
///
/// Calling it again after the first successful call has no effect.
pub fn init_logging(log_level: &str, log_to_file: bool) -> Result<()> {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("{log_level},seatbelt_exec=debug")));

        if log_to_file
            && let Some(proj_dirs) = ProjectDirs::from("com", "SeatbeltExec", "seatbelt_exec")
        {
            let log_dir = proj_dirs.cache_dir();

            // tracing_appender::rolling::daily panics on permission errors.
            if can_write_to(log_dir) {
                let file_appender = tracing_appender::rolling::daily(log_dir, "seatbelt_exec.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(layer().with_writer(non_blocking).with_ansi(false))
                    .init();
                // Leaked so buffered lines are flushed at exit.
                Box::leak(Box::new(guard));
                return;
            }
        }

        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer().with_writer(stderr).with_ansi(true))
            .init();
    });

    Ok(())
}

/// Create `dir` if needed and confirm a file can be written into it.
fn can_write_to(dir: &Path) -> bool {
    if std::fs::create_dir_all(dir).is_err() {
        return false;
    }

    let probe = dir.join(".seatbelt_exec_log_test");
    match std::fs::write(&probe, "test") {
        Ok(()) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn can_write_to_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        assert!(can_write_to(&nested));
        assert!(nested.is_dir());
        assert!(!nested.join(".seatbelt_exec_log_test").exists());
    }

    #[test]
    fn init_logging_is_idempotent() {
        init_test_logging();
        assert!(init_logging("info", false).is_ok());
    }
}
