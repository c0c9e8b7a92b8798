// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neuroatlas-structures
//!
//! Core data types shared by every NeuroAtlas crate:
//! - [`RegionHierarchy`]: region tree with acronym/pattern lookup
//! - [`VoxelData`] and [`VoxelGeometry`]: named datasets and their grid
//! - [`VoxelMask`]: boolean voxel sets
//! - [`SpatialQuery`] and [`CellQuery`]: query values
//! - [`AtlasStore`]: the storage seam, with [`InMemoryAtlasStore`]
//! - [`AtlasError`] and the [`Diagnosed`] warning channel

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod diagnostics;
pub mod error;
pub mod query;
pub mod region_hierarchy;
pub mod store;
pub mod voxel_data;
pub mod voxel_mask;

pub use diagnostics::{AtlasWarning, Diagnosed};
pub use error::{AtlasError, AtlasResult};
pub use query::{AxisConstraint, CellQuery, SpatialQuery, SynapseClass};
pub use region_hierarchy::{RegionAttribute, RegionHierarchy, RegionId, RegionNode};
pub use store::{AtlasStore, InMemoryAtlasStore, BRAIN_REGIONS};
pub use voxel_data::{Position, VoxelData, VoxelGeometry, VoxelIndex};
pub use voxel_mask::VoxelMask;
