// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-neuroatlas-spatial` to raise one crate to
//! debug level, and `--debug-all`.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Per-crate debug selection
///
/// # Example
/// ```rust
/// use neuroatlas_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-neuroatlas-spatial".to_string()]);
/// assert!(flags.is_enabled("neuroatlas-spatial"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Parse debug flags from command-line arguments
    ///
    /// Looks for arguments matching `--debug-{crate-name}` pattern.
    /// Also supports `--debug-all` to enable all crates.
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();

        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enabled_crates.insert(crate_name.to_string());
            }
        }

        flags
    }

    fn enable_all(&mut self) {
        for crate_name in KNOWN_CRATES {
            self.enabled_crates.insert(crate_name.to_string());
        }
    }

    /// Add crates from a comma-separated list (`all` enables every known crate)
    pub fn extend_from_list(&mut self, list: &str) {
        if list.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in list.split(',') {
            let crate_name = crate_name.trim();
            if !crate_name.is_empty() {
                self.enabled_crates.insert(crate_name.to_string());
            }
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// Get log level filter for a crate
    pub fn log_level(&self, crate_name: &str) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Create a tracing filter from debug flags
    ///
    /// Tracing targets are module paths, so crate names are written with
    /// underscores: `neuroatlas_spatial=debug,info`.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name.replace('-', "_")))
            .collect();
        filters.push(default_level.to_string());
        filters.join(",")
    }
}

/// Helper function to parse debug flags from the process
///
/// Checks both command-line arguments and the `NEUROATLAS_DEBUG` environment
/// variable (comma-separated crate names, or `all`).
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());

    if let Ok(env_var) = env::var("NEUROATLAS_DEBUG") {
        flags.extend_from_list(&env_var);
    }

    flags
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  NEUROATLAS_DEBUG={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  NEUROATLAS_DEBUG=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-neuroatlas-spatial".to_string()]);
        assert!(flags.is_enabled("neuroatlas-spatial"));
        assert!(!flags.is_enabled("neuroatlas-config"));
    }

    #[test]
    fn test_multiple_crate_flags_ignore_other_args() {
        let flags = CrateDebugFlags::from_args(vec![
            "validate".to_string(),
            "--debug-neuroatlas-spatial".to_string(),
            "--debug-neuroatlas-structures".to_string(),
        ]);
        assert!(flags.is_enabled("neuroatlas-spatial"));
        assert!(flags.is_enabled("neuroatlas-structures"));
        assert_eq!(flags.enabled_crates.len(), 2);
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_extend_from_list() {
        let mut flags = CrateDebugFlags::default();
        flags.extend_from_list(" neuroatlas-config , ,neuroatlas");
        assert!(flags.is_enabled("neuroatlas-config"));
        assert!(flags.is_enabled("neuroatlas"));
        assert_eq!(flags.enabled_crates.len(), 2);
    }

    #[test]
    fn test_filter_string() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-neuroatlas-spatial".to_string()]);
        assert_eq!(flags.to_filter_string("warn"), "neuroatlas_spatial=debug,warn");
        assert_eq!(CrateDebugFlags::default().to_filter_string("info"), "info");
    }

    #[test]
    fn test_log_level() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-neuroatlas-spatial".to_string()]);
        assert_eq!(flags.log_level("neuroatlas-spatial"), tracing::Level::DEBUG);
        assert_eq!(flags.log_level("neuroatlas-config"), tracing::Level::INFO);
    }
}
