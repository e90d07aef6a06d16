//! Logging setup
//!
//! Only initializes if the QUOTEBOOK_LOG environment variable is set.
//! Logs go to a file so they never interleave with command output.

use std::fs::OpenOptions;

use tracing::info;
use tracing_subscriber::EnvFilter;

use quotebook_core::Config;

/// Initialize file logging (config.log_file or {data_dir}/debug.log)
pub fn init(config: &Config) {
    let Ok(log_level) = std::env::var("QUOTEBOOK_LOG") else {
        return;
    };

    let log_path = config
        .log_file
        .clone()
        .unwrap_or_else(|| config.data_dir.join("debug.log"));

    let log_file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "quotebook_core={},quotebook_cli={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}
