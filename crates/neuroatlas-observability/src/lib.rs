// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neuroatlas-observability
//!
//! Logging set-up for NeuroAtlas with per-crate debug flag support.
//!
//! Library crates only emit `tracing` events; the application (a batch
//! validation run, a notebook kernel, a test) installs a subscriber once with
//! [`init_logging`].
//!
//! ## Features
//! - `file-logging`: per-run JSON log files with retention

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Known NeuroAtlas crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neuroatlas",
    "neuroatlas-structures",
    "neuroatlas-spatial",
    "neuroatlas-config",
];
