// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neuroatlas-spatial
//!
//! Spatial queries over an opened brain atlas.
//!
//! - [`convention`]: which acronym spelling an atlas uses, and translation of
//!   logical region/layer names into it
//! - [`MaskEngine`]: voxel masks for region/layer/column/depth/height queries
//! - [`PrincipalAxis`]: per-voxel depth, height and thickness
//! - [`PositionSampler`]: random positions inside a mask
//! - [`CellDensityResolver`]: density fields by mtype and synapse class
//!
//! All of them hang off an [`Atlas`] handle:
//!
//! ```rust,ignore
//! use neuroatlas_spatial::Atlas;
//! use neuroatlas_structures::SpatialQuery;
//!
//! let atlas = Atlas::with_defaults(store)?;
//! let mask = atlas.masks().get_mask(&SpatialQuery::new().region("SSp-ll").layer("L1"))?;
//! for warning in &mask.warnings {
//!     eprintln!("{}", warning);
//! }
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod atlas;
pub mod convention;
pub mod density;
pub mod masks;
pub mod principal_axis;
pub mod sampler;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use atlas::Atlas;
pub use convention::{ConventionProfile, LayerConvention, RegionConvention};
pub use density::{CellDensityResolver, DensityConvention};
pub use masks::MaskEngine;
pub use principal_axis::{Interval, PrincipalAxis};
pub use sampler::{sample, PositionSampler, Positions};
