//! Ambient logging setup (SPEC_FULL.md §10): `tracing` + `tracing-subscriber`
//! + `tracing-appender`, wired the way the teacher crate wires its own
//! global subscriber in `main.rs`/`lib.rs` — `EnvFilter` driven by
//! `RUST_LOG`, JSON output for production, a rolling file appender when a
//! directory is supplied.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber. Returns the appender's guard
/// when file logging is enabled — callers must keep it alive for the
/// duration of the process, the same contract `tracing_appender` always
/// carries.
pub fn init(log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "omnirouter.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_writer(non_blocking)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}
