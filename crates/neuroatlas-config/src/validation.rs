// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Ensures configuration values are consistent before an atlas is opened with
//! them.

use crate::types::LAYER_PLACEHOLDER;
use crate::{AtlasConfig, ConfigError, ConfigResult};
use std::collections::HashSet;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    DuplicateLayer { layer: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::DuplicateLayer { layer } => {
                write!(f, "Layer {} appears more than once in layers.stack", layer)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Required dataset names
/// - A non-empty layer stack without duplicates
/// - A boundary template that names the layer
/// - Known log level and non-empty excitatory morphology list
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every violation
pub fn validate_config(config: &AtlasConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_required_fields(config, &mut errors);
    validate_layer_stack(config, &mut errors);
    validate_value_ranges(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_required_fields(config: &AtlasConfig, errors: &mut Vec<ConfigValidationError>) {
    let required = [
        ("atlas.brain_regions_dataset", &config.atlas.brain_regions_dataset),
        ("principal_axis.position_dataset", &config.principal_axis.position_dataset),
        ("principal_axis.boundary_template", &config.principal_axis.boundary_template),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: field.to_string(),
            });
        }
    }
}

fn validate_layer_stack(config: &AtlasConfig, errors: &mut Vec<ConfigValidationError>) {
    if config.layers.stack.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "layers.stack".to_string(),
        });
        return;
    }

    let mut seen = HashSet::new();
    for layer in &config.layers.stack {
        if layer.trim().is_empty() {
            errors.push(ConfigValidationError::InvalidValue {
                field: "layers.stack".to_string(),
                reason: "layer names must not be empty".to_string(),
            });
        } else if !seen.insert(layer.as_str()) {
            errors.push(ConfigValidationError::DuplicateLayer {
                layer: layer.clone(),
            });
        }
    }
}

fn validate_value_ranges(config: &AtlasConfig, errors: &mut Vec<ConfigValidationError>) {
    let template = &config.principal_axis.boundary_template;
    if !template.trim().is_empty() && !template.contains(LAYER_PLACEHOLDER) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "principal_axis.boundary_template".to_string(),
            reason: format!("must contain {}", LAYER_PLACEHOLDER),
        });
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
        });
    }

    if config.density.excitatory_morphologies.is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "density.excitatory_morphologies".to_string(),
        });
    }
}
