// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Random positions inside a query mask.
//!
//! Each draw picks one voxel uniformly among the mask's voxels and returns the
//! position of its lower corner.

use neuroatlas_structures::{
    AtlasError, AtlasResult, AtlasStore, AtlasWarning, Position, SpatialQuery, VoxelGeometry,
    VoxelIndex,
};
use rand::Rng;
use tracing::debug;

use crate::atlas::Atlas;

/// Voxel list of one query, ready for repeated sampling
#[derive(Debug, Clone)]
pub struct PositionSampler {
    geometry: VoxelGeometry,
    indices: Vec<VoxelIndex>,
    warnings: Vec<AtlasWarning>,
}

impl PositionSampler {
    /// Resolve `query` and enumerate its voxels
    ///
    /// # Errors
    ///
    /// [`AtlasError::EmptyRegion`] when the mask has no voxels, plus any error
    /// of [`MaskEngine::get_mask`](crate::MaskEngine::get_mask).
    pub fn new<S: AtlasStore>(atlas: &Atlas<S>, query: &SpatialQuery) -> AtlasResult<Self> {
        let (mask, warnings) = atlas.masks().get_mask(query)?.into_parts();
        if mask.is_empty() {
            return Err(AtlasError::EmptyRegion(format!("{:?}", query)));
        }
        let indices = mask.indices();
        debug!("Sampler over {} voxels", indices.len());
        Ok(Self {
            geometry: *atlas.geometry(),
            indices,
            warnings,
        })
    }

    /// Endless stream of positions; every call starts a new stream
    pub fn positions<R: Rng>(&self, rng: R) -> Positions<'_, R> {
        Positions { sampler: self, rng }
    }

    pub fn voxel_count(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[VoxelIndex] {
        &self.indices
    }

    /// Warnings raised while resolving the query
    pub fn warnings(&self) -> &[AtlasWarning] {
        &self.warnings
    }
}

/// Iterator returned by [`PositionSampler::positions`]
pub struct Positions<'a, R> {
    sampler: &'a PositionSampler,
    rng: R,
}

impl<R: Rng> Iterator for Positions<'_, R> {
    type Item = Position;

    fn next(&mut self) -> Option<Position> {
        let pick = self.rng.gen_range(0..self.sampler.indices.len());
        Some(self.sampler.geometry.index_to_position(self.sampler.indices[pick]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// Draw `n` positions from `query` using the atlas's configured random stream
pub fn sample<S: AtlasStore>(
    atlas: &Atlas<S>,
    query: &SpatialQuery,
    n: usize,
) -> AtlasResult<Vec<Position>> {
    let sampler = PositionSampler::new(atlas, query)?;
    Ok(sampler.positions(atlas.rng()).take(n).collect())
}
