// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Atlas storage abstraction.

The engine never reads files itself. Everything it needs from an atlas comes
through [`AtlasStore`]; file formats and region-map storage belong to the
implementor.
*/

use ahash::AHashMap;
use ndarray::Array3;
use std::collections::BTreeSet;

use crate::error::{AtlasError, AtlasResult};
use crate::region_hierarchy::{RegionHierarchy, RegionId};
use crate::voxel_data::VoxelData;

/// Name of the label dataset every atlas carries
pub const BRAIN_REGIONS: &str = "brain_regions";

/// Read-only access to an opened atlas
pub trait AtlasStore: Send + Sync {
    /// Region tree of the atlas
    fn load_region_map(&self) -> AtlasResult<RegionHierarchy>;

    /// Load a named voxel dataset
    fn load_data(&self, name: &str) -> AtlasResult<VoxelData>;

    /// Descendant-inclusive mask of an acronym, or of an `@`-prefixed acronym regex
    fn get_region_mask(&self, acronym_or_pattern: &str) -> AtlasResult<Array3<bool>>;

    /// Names of every dataset available in the atlas
    fn list_files(&self) -> AtlasResult<BTreeSet<String>>;
}

/// Atlas held entirely in memory
///
/// Region masks are computed from the hierarchy and the label dataset, the
/// same way a file-backed store resolves them.
#[derive(Debug, Clone)]
pub struct InMemoryAtlasStore {
    hierarchy: RegionHierarchy,
    datasets: AHashMap<String, VoxelData>,
    labels_name: String,
}

impl InMemoryAtlasStore {
    /// Create a store from a hierarchy and its `brain_regions` label dataset
    pub fn new(hierarchy: RegionHierarchy, brain_regions: VoxelData) -> Self {
        Self::with_labels(hierarchy, BRAIN_REGIONS, brain_regions)
    }

    /// Same as [`new`](Self::new) with a custom label dataset name
    pub fn with_labels(hierarchy: RegionHierarchy, labels_name: &str, labels: VoxelData) -> Self {
        let mut datasets = AHashMap::new();
        datasets.insert(labels_name.to_string(), labels);
        Self {
            hierarchy,
            datasets,
            labels_name: labels_name.to_string(),
        }
    }

    /// Add or replace a dataset
    pub fn insert_dataset(&mut self, name: impl Into<String>, data: VoxelData) {
        self.datasets.insert(name.into(), data);
    }

    pub fn with_dataset(mut self, name: impl Into<String>, data: VoxelData) -> Self {
        self.insert_dataset(name, data);
        self
    }

    pub fn remove_dataset(&mut self, name: &str) -> Option<VoxelData> {
        self.datasets.remove(name)
    }

    pub fn hierarchy(&self) -> &RegionHierarchy {
        &self.hierarchy
    }

    fn labels(&self) -> AtlasResult<&VoxelData> {
        self.datasets
            .get(&self.labels_name)
            .ok_or_else(|| AtlasError::DatasetNotFound(self.labels_name.clone()))
    }
}

impl AtlasStore for InMemoryAtlasStore {
    fn load_region_map(&self) -> AtlasResult<RegionHierarchy> {
        Ok(self.hierarchy.clone())
    }

    fn load_data(&self, name: &str) -> AtlasResult<VoxelData> {
        self.datasets
            .get(name)
            .cloned()
            .ok_or_else(|| AtlasError::DatasetNotFound(name.to_string()))
    }

    fn get_region_mask(&self, acronym_or_pattern: &str) -> AtlasResult<Array3<bool>> {
        let ids = self.hierarchy.find_acronym(acronym_or_pattern)?;
        let labels = self.labels()?.scalar_field()?;
        Ok(labels.mapv(|label| {
            label > 0.0 && label.fract() == 0.0 && ids.contains(&(label as RegionId))
        }))
    }

    fn list_files(&self) -> AtlasResult<BTreeSet<String>> {
        Ok(self.datasets.keys().cloned().collect())
    }
}
