use std::error::Error;
use std::path::Path;

use tracing_appender::rolling::Rotation;
use tracing_subscriber::EnvFilter;

const LOG_PREFIX: &str = "studytimer.log";

/// Filter directive: an explicit level for this crate, else `RUST_LOG` as
/// given, else `info` for this crate
pub fn filter_directive(log_level: Option<&str>) -> String {
    let crate_level = |level: &str| format!("{}={level}", env!("CARGO_PKG_NAME").replace('-', "_"));

    match log_level {
        Some(level) => crate_level(level),
        None => std::env::var("RUST_LOG").unwrap_or_else(|_| crate_level("info")),
    }
}

/// Send tracing output to daily files under `log_dir`.
///
/// The terminal belongs to the TUI, so nothing is written to stdout.
pub fn enable_logging(
    log_dir: &Path,
    log_level: Option<&str>,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let appender = tracing_appender::rolling::Builder::new()
        .rotation(Rotation::DAILY)
        .max_log_files(5)
        .filename_prefix(LOG_PREFIX)
        .build(log_dir)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter_directive(log_level)))
        .with_writer(appender)
        .with_ansi(false)
        .try_init()?;

    Ok(())
}
