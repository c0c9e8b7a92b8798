// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # NeuroAtlas - region/layer voxel masks over 3D brain atlases
//!
//! NeuroAtlas turns logical spatial queries (region, layer, column, depth,
//! height) into boolean voxel masks over a brain atlas, whatever acronym
//! convention the atlas happens to use. On top of the masks it derives
//! principal-axis depth/height fields, samples random positions and
//! aggregates cell densities.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! neuroatlas = "0.3"
//! ```
//!
//! ```rust,ignore
//! use neuroatlas::prelude::*;
//!
//! let atlas = neuroatlas::open_atlas(store, None)?;
//! let query = SpatialQuery::new()
//!     .region("SSp-ll")
//!     .layer("L5")
//!     .depth(AxisConstraint::absolute(0.0, 500.0));
//!
//! let mask = atlas.masks().get_mask(&query)?;
//! println!("{} voxels, {} warnings", mask.value.count(), mask.warnings.len());
//!
//! let positions = neuroatlas::spatial::sample(&atlas, &query, 100)?;
//! ```
//!
//! ## Feature Flags
//!
//! - **`observability`** (default): logging initialisation and per-crate debug flags
//! - **`file-logging`**: per-run JSON log files with retention
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: neuroatlas-structures, neuroatlas-config   │
//! │  (hierarchy, voxel data, masks, queries, store trait)   │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Algorithms: neuroatlas-spatial                         │
//! │  (conventions, masks, principal axis, sampling, density)│
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Atlas file I/O is not part of this crate: implement
//! [`AtlasStore`](structures::AtlasStore) for your storage, or assemble an
//! [`InMemoryAtlasStore`](structures::InMemoryAtlasStore).
//!
//! ## License
//!
//! Apache-2.0

use std::path::Path;

// Re-export foundation
pub use neuroatlas_config as config;
pub use neuroatlas_structures as structures;

// Re-export algorithms
pub use neuroatlas_spatial as spatial;

// Re-export infrastructure
#[cfg(feature = "observability")]
pub use neuroatlas_observability as observability;

pub use ndarray;

use neuroatlas_config::{AtlasConfig, ConfigError};
use neuroatlas_spatial::Atlas;
use neuroatlas_structures::{AtlasError, AtlasResult, AtlasStore};

/// Load configuration (file, environment, no CLI overrides) and open `store`
///
/// With `config_path` unset, `neuroatlas.toml` is searched from the current
/// directory upward; if none is found the defaults apply.
pub fn open_atlas<S: AtlasStore>(store: S, config_path: Option<&Path>) -> AtlasResult<Atlas<S>> {
    let config = match config_path {
        Some(path) => neuroatlas_config::load_config(Some(path), None),
        None => match neuroatlas_config::find_config_file() {
            Ok(path) => neuroatlas_config::load_config(Some(&path), None),
            Err(ConfigError::FileNotFound(searched)) => {
                tracing::info!("No configuration file, using defaults ({})", searched);
                let mut config = AtlasConfig::default();
                neuroatlas_config::apply_environment_overrides(&mut config).map(|_| config)
            }
            Err(e) => Err(e),
        },
    }
    .map_err(|e| AtlasError::Config(e.to_string()))?;
    tracing::debug!("Opening atlas with layer stack {:?}", config.layers.stack);
    Atlas::open(store, config)
}

/// Install console logging at the configured `[logging] level`
///
/// Per-crate debug flags come from the command line and `NEUROATLAS_DEBUG`.
/// Fails if the level is not a valid filter or a subscriber is already set.
#[cfg(feature = "observability")]
pub fn init_logging_from_config(config: &AtlasConfig) -> anyhow::Result<()> {
    let flags = neuroatlas_observability::parse_debug_flags();
    neuroatlas_observability::init_logging(&flags, &config.logging.level)
}

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::AtlasConfig;
    pub use crate::spatial::{
        Atlas, CellDensityResolver, ConventionProfile, DensityConvention, LayerConvention,
        MaskEngine, PositionSampler, PrincipalAxis, RegionConvention,
    };
    pub use crate::structures::{
        AtlasError, AtlasResult, AtlasStore, AtlasWarning, AxisConstraint, CellQuery, Diagnosed,
        InMemoryAtlasStore, RegionHierarchy, SpatialQuery, SynapseClass, VoxelData, VoxelGeometry,
        VoxelMask,
    };

    #[cfg(feature = "observability")]
    pub use crate::init_logging_from_config;
    #[cfg(feature = "observability")]
    pub use crate::observability::{init_logging, parse_debug_flags, CrateDebugFlags};
}
