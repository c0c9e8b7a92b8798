// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always; with the `file-logging` feature, per-run JSON log
//! files with configurable retention.

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

fn build_filter(debug_flags: &CrateDebugFlags, default_level: &str) -> Result<EnvFilter> {
    let filter = debug_flags.to_filter_string(default_level);
    EnvFilter::try_new(&filter).with_context(|| format!("Invalid log filter: {}", filter))
}

/// Install a console subscriber
///
/// `RUST_LOG`, when set, replaces the filter derived from the debug flags.
///
/// # Errors
///
/// Fails if the filter is invalid or a global subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, default_level: &str) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_filter(debug_flags, default_level)?,
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter);

    Registry::default()
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

#[cfg(feature = "file-logging")]
pub use file::{init_file_logging, LoggingGuard};

#[cfg(feature = "file-logging")]
mod file {
    use super::*;
    use chrono::{NaiveDateTime, Utc};
    use std::path::{Path, PathBuf};
    use tracing_appender::rolling;

    /// Keeps the non-blocking writers alive; logs flush on drop
    pub struct LoggingGuard {
        _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
        log_dir: PathBuf,
    }

    impl LoggingGuard {
        /// Get the log directory path of this run
        pub fn log_dir(&self) -> &Path {
            &self.log_dir
        }
    }

    /// Initialize logging with file output and console output
    ///
    /// Creates a timestamped folder structure:
    /// ```text
    /// ./logs/
    ///   └── run_20250101_120000/
    ///       ├── neuroatlas-spatial.log
    ///       ├── ...
    ///       └── neuroatlas.log (combined)
    /// ```
    ///
    /// # Arguments
    /// * `debug_flags` - Per-crate debug flags for filtering
    /// * `default_level` - Level for crates without a debug flag
    /// * `log_dir` - Base directory for logs (default: `./logs`)
    /// * `retention_days` - Keep logs for N days (default: 30)
    /// * `retention_runs` - Keep N most recent runs (default: 10)
    pub fn init_file_logging(
        debug_flags: &CrateDebugFlags,
        default_level: &str,
        log_dir: Option<PathBuf>,
        retention_days: Option<u64>,
        retention_runs: Option<usize>,
    ) -> Result<LoggingGuard> {
        let base_log_dir = log_dir.unwrap_or_else(|| PathBuf::from("./logs"));

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let run_folder = base_log_dir.join(format!("run_{}", timestamp));
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

        cleanup_old_logs(&base_log_dir, retention_days, retention_runs)?;

        let mut layers = Vec::new();
        let mut file_guards = Vec::new();

        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_filter(build_filter(debug_flags, default_level)?)
            .boxed();
        layers.push(console_layer);

        for crate_name in crate::KNOWN_CRATES {
            let file_appender = rolling::never(&run_folder, format!("{}.log", crate_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            file_guards.push(guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(EnvFilter::try_new(format!(
                    "{}=debug,off",
                    crate_name.replace('-', "_")
                ))?)
                .boxed();
            layers.push(file_layer);
        }

        let combined_appender = rolling::never(&run_folder, "neuroatlas.log");
        let (combined_non_blocking, combined_guard) = tracing_appender::non_blocking(combined_appender);
        file_guards.push(combined_guard);

        let combined_layer = tracing_subscriber::fmt::layer()
            .with_writer(combined_non_blocking)
            .with_target(true)
            .json()
            .with_filter(build_filter(debug_flags, default_level)?)
            .boxed();
        layers.push(combined_layer);

        Registry::default()
            .with(layers)
            .try_init()
            .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

        Ok(LoggingGuard {
            _file_guards: file_guards,
            log_dir: run_folder,
        })
    }

    /// Clean up old run directories based on retention policy
    fn cleanup_old_logs(
        base_log_dir: &Path,
        retention_days: Option<u64>,
        retention_runs: Option<usize>,
    ) -> Result<()> {
        if !base_log_dir.exists() {
            return Ok(());
        }

        let retention_days = retention_days.unwrap_or(30);
        let retention_runs = retention_runs.unwrap_or(10);
        let cutoff = Utc::now().naive_utc() - chrono::Duration::days(retention_days as i64);

        let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
        for entry in std::fs::read_dir(base_log_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let stamp = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix("run_"))
                .and_then(|s| NaiveDateTime::parse_from_str(s, "%Y%m%d_%H%M%S").ok());
            if let Some(stamp) = stamp {
                runs.push((path, stamp));
            }
        }

        // Newest first
        runs.sort_by(|a, b| b.1.cmp(&a.1));

        for (position, (path, stamp)) in runs.iter().enumerate() {
            if *stamp < cutoff || position >= retention_runs {
                if let Err(e) = std::fs::remove_dir_all(path) {
                    tracing::warn!("Failed to remove old log directory {}: {}", path.display(), e);
                }
            }
        }

        Ok(())
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_default_level_is_rejected() {
        let flags = CrateDebugFlags::default();
        assert!(build_filter(&flags, "neuroatlas=notalevel").is_err());
        assert!(build_filter(&flags, "info").is_ok());
    }

    #[test]
    fn test_second_init_fails_instead_of_panicking() {
        let flags = CrateDebugFlags::default();
        let first = init_logging(&flags, "warn");
        let second = init_logging(&flags, "warn");
        // Whichever test installs the global subscriber first, the second call must error
        assert!(first.is_err() || second.is_err());
    }
}
