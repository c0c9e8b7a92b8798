// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! This module implements the 3-tier configuration loading system:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{AtlasConfig, ConfigError, ConfigResult};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name
pub const CONFIG_FILE_NAME: &str = "neuroatlas.toml";

/// Find the NeuroAtlas configuration file
///
/// Search order:
/// 1. `NEUROATLAS_CONFIG_PATH` environment variable
/// 2. Current working directory: `./neuroatlas.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("NEUROATLAS_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by NEUROATLAS_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();

    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    for path in &search_paths {
        if path.exists() {
            return Ok(path.clone());
        }
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "NeuroAtlas configuration file '{}' not found in any of these locations:\n{}\n\nSet NEUROATLAS_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, will search for config file.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if config file is not found, contains invalid TOML, or an
/// override value cannot be parsed
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<AtlasConfig> {
    let config_file = if let Some(path) = config_path {
        path.to_path_buf()
    } else {
        find_config_file()?
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: AtlasConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config)?;

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

fn parse_layer_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_seed(key: &str, value: &str) -> ConfigResult<Option<u64>> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidValue(format!("{} = {:?} is not a u64 seed", key, value)))
}

/// Apply one `section.key` override
fn apply_override(config: &mut AtlasConfig, key: &str, value: &str) -> ConfigResult<()> {
    match key {
        "atlas.brain_regions_dataset" => config.atlas.brain_regions_dataset = value.to_string(),
        "layers.stack" => config.layers.stack = parse_layer_list(value),
        "principal_axis.position_dataset" => {
            config.principal_axis.position_dataset = value.to_string()
        }
        "principal_axis.boundary_template" => {
            config.principal_axis.boundary_template = value.to_string()
        }
        "density.excitatory_morphologies" => {
            config.density.excitatory_morphologies = parse_layer_list(value)
        }
        "sampling.seed" => config.sampling.seed = parse_seed(key, value)?,
        "logging.level" => config.logging.level = value.to_string(),
        _ => {
            return Err(ConfigError::InvalidValue(format!(
                "unknown configuration key: {}",
                key
            )))
        }
    }
    Ok(())
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `NEUROATLAS_BRAIN_REGIONS_DATASET` -> `atlas.brain_regions_dataset`
/// - `NEUROATLAS_LAYER_STACK` -> `layers.stack` (comma-separated, bottom to top)
/// - `NEUROATLAS_POSITION_DATASET` -> `principal_axis.position_dataset`
/// - `NEUROATLAS_BOUNDARY_TEMPLATE` -> `principal_axis.boundary_template`
/// - `NEUROATLAS_SAMPLING_SEED` -> `sampling.seed`
/// - `NEUROATLAS_LOG_LEVEL` -> `logging.level`
pub fn apply_environment_overrides(config: &mut AtlasConfig) -> ConfigResult<()> {
    const ENV_KEYS: &[(&str, &str)] = &[
        ("NEUROATLAS_BRAIN_REGIONS_DATASET", "atlas.brain_regions_dataset"),
        ("NEUROATLAS_LAYER_STACK", "layers.stack"),
        ("NEUROATLAS_POSITION_DATASET", "principal_axis.position_dataset"),
        ("NEUROATLAS_BOUNDARY_TEMPLATE", "principal_axis.boundary_template"),
        ("NEUROATLAS_SAMPLING_SEED", "sampling.seed"),
        ("NEUROATLAS_LOG_LEVEL", "logging.level"),
    ];

    for (var, key) in ENV_KEYS {
        if let Ok(value) = env::var(var) {
            apply_override(config, key, &value)?;
        }
    }
    Ok(())
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Map of dotted keys to values (e.g., `{"sampling.seed": "42"}`)
///
/// # Errors
///
/// Unknown keys and unparsable values are rejected
pub fn apply_cli_overrides(
    config: &mut AtlasConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    for (key, value) in cli_args {
        apply_override(config, key, value)?;
    }
    Ok(())
}
