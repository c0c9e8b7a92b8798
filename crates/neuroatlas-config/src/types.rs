// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `neuroatlas.toml`.

use serde::{Deserialize, Serialize};

/// Placeholder substituted by the layer name in dataset templates
pub const LAYER_PLACEHOLDER: &str = "{layer}";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub atlas: AtlasSection,
    pub layers: LayerStackConfig,
    pub principal_axis: PrincipalAxisConfig,
    pub density: DensityConfig,
    pub sampling: SamplingConfig,
    pub logging: LoggingConfig,
}

/// Dataset names common to every atlas
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AtlasSection {
    /// Integer label volume; 0 marks voxels outside the brain
    pub brain_regions_dataset: String,
}

impl Default for AtlasSection {
    fn default() -> Self {
        Self {
            brain_regions_dataset: "brain_regions".to_string(),
        }
    }
}

/// Anatomical layers ordered along the principal axis
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LayerStackConfig {
    /// Bottom to top, e.g. cortical L6 first and L1 last
    pub stack: Vec<String>,
}

impl LayerStackConfig {
    pub fn bottom(&self) -> Option<&str> {
        self.stack.first().map(String::as_str)
    }

    pub fn top(&self) -> Option<&str> {
        self.stack.last().map(String::as_str)
    }

    pub fn contains(&self, layer: &str) -> bool {
        self.stack.iter().any(|l| l == layer)
    }
}

impl Default for LayerStackConfig {
    fn default() -> Self {
        Self {
            stack: ["L6", "L5", "L4", "L3", "L2", "L1"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Names of the principal-axis datasets
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PrincipalAxisConfig {
    /// Per-voxel position along the principal axis
    pub position_dataset: String,
    /// Per-layer (bottom, top) boundary dataset, `{layer}` is substituted
    pub boundary_template: String,
}

impl PrincipalAxisConfig {
    pub fn boundary_dataset(&self, layer: &str) -> String {
        self.boundary_template.replace(LAYER_PLACEHOLDER, layer)
    }
}

impl Default for PrincipalAxisConfig {
    fn default() -> Self {
        Self {
            position_dataset: "[PH]y".to_string(),
            boundary_template: "[PH]{layer}".to_string(),
        }
    }
}

/// Cell density classification
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Morphology names (the part of an mtype after the layer prefix) that
    /// are excitatory; every other morphology is inhibitory
    pub excitatory_morphologies: Vec<String>,
}

impl DensityConfig {
    /// `TPC:A` counts as `TPC`
    pub fn is_excitatory_morphology(&self, morphology: &str) -> bool {
        let base = morphology.split(':').next().unwrap_or(morphology);
        self.excitatory_morphologies.iter().any(|m| m == base)
    }
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            excitatory_morphologies: ["PC", "SS", "SP", "STPC", "TPC", "UPC", "IPC", "BPC", "HPC"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Random position sampling
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Fixed seed for reproducible draws; entropy-seeded when absent
    pub seed: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_stack_ends() {
        let layers = LayerStackConfig::default();
        assert_eq!(layers.bottom(), Some("L6"));
        assert_eq!(layers.top(), Some("L1"));
        assert!(layers.contains("L4"));
        assert!(!layers.contains("L7"));
    }

    #[test]
    fn test_boundary_dataset_name() {
        let axis = PrincipalAxisConfig::default();
        assert_eq!(axis.boundary_dataset("L2"), "[PH]L2");
    }

    #[test]
    fn test_excitatory_morphology() {
        let density = DensityConfig::default();
        assert!(density.is_excitatory_morphology("PC"));
        assert!(density.is_excitatory_morphology("TPC:A"));
        assert!(!density.is_excitatory_morphology("MC"));
        assert!(!density.is_excitatory_morphology("ChC"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AtlasConfig = toml::from_str("[sampling]\nseed = 7\n").unwrap();
        assert_eq!(config.sampling.seed, Some(7));
        assert_eq!(config.layers, LayerStackConfig::default());
        assert_eq!(config.atlas.brain_regions_dataset, "brain_regions");
    }
}
