//! Logging setup.
//!
//! JSON lines go to a daily rolling file under the log directory; a pretty
//! human-readable layer goes to stderr so stdout stays free for rendered
//! output. `RUST_LOG` wins over the configured level.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const LOG_FILE_NAME: &str = "campaign-letter.log";

/// Initialize tracing. Keep the returned guard alive for the life of the
/// process or buffered file output is lost.
pub fn init(log_dir: &Path, level: &str) -> WorkerGuard {
    if !log_dir.exists() {
        if let Err(e) = fs::create_dir_all(log_dir) {
            eprintln!("Failed to create logs directory: {}", e);
        }
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = build_filter(level);

    // File Layer: JSON format for easy parsing/ingestion
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .with_filter(env_filter.clone());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .pretty()
        .with_filter(env_filter);

    if let Err(e) = tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
    {
        eprintln!("Failed to initialize tracing subscriber: {}", e);
    }

    // Redirect `log` macros (config loading, content fetches) to tracing.
    // The subscriber may already have installed this; that error is harmless.
    if let Err(e) = tracing_log::LogTracer::init() {
        tracing::debug!("LogTracer not installed: {}", e);
    }

    log::info!(
        "Logging initialized. Writing to: {:?} (daily rolling)",
        log_dir.join(LOG_FILE_NAME)
    );

    guard
}

/// `RUST_LOG` if set and valid, otherwise `level`, otherwise `info`.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
