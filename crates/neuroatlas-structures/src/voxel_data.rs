// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Voxel datasets and the grid geometry they share.

use ndarray::{Array3, ArrayD, Axis, Ix3};
use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, AtlasResult};

/// Voxel index (i, j, k)
pub type VoxelIndex = [usize; 3];

/// Continuous position in atlas space (same unit as the voxel dimensions, µm)
pub type Position = [f64; 3];

/// Shape and placement of a voxel grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoxelGeometry {
    pub shape: (usize, usize, usize),
    pub voxel_dimensions: [f64; 3],
    pub offset: [f64; 3],
}

impl VoxelGeometry {
    pub fn new(
        shape: (usize, usize, usize),
        voxel_dimensions: [f64; 3],
        offset: [f64; 3],
    ) -> AtlasResult<Self> {
        if voxel_dimensions.iter().any(|d| !d.is_finite() || *d <= 0.0) {
            return Err(AtlasError::InvalidData(format!(
                "voxel dimensions must be positive, got {:?}",
                voxel_dimensions
            )));
        }
        if offset.iter().any(|o| !o.is_finite()) {
            return Err(AtlasError::InvalidData(format!(
                "offset must be finite, got {:?}",
                offset
            )));
        }
        Ok(Self {
            shape,
            voxel_dimensions,
            offset,
        })
    }

    /// Position of the voxel's lower corner: `offset + voxel_dimensions * index`
    pub fn index_to_position(&self, index: VoxelIndex) -> Position {
        let mut position = [0.0; 3];
        for axis in 0..3 {
            position[axis] = self.offset[axis] + self.voxel_dimensions[axis] * index[axis] as f64;
        }
        position
    }

    /// Voxel containing `position`, `None` outside the grid
    ///
    /// A position lying on a voxel boundary (up to floating point noise)
    /// belongs to the voxel it opens, so corner positions round-trip.
    pub fn position_to_index(&self, position: Position) -> Option<VoxelIndex> {
        let extent = [self.shape.0, self.shape.1, self.shape.2];
        let mut index = [0usize; 3];
        for axis in 0..3 {
            let scaled = (position[axis] - self.offset[axis]) / self.voxel_dimensions[axis];
            if !scaled.is_finite() {
                return None;
            }
            let nearest = scaled.round();
            let cell = if (scaled - nearest).abs() < 1e-9 * nearest.abs().max(1.0) {
                nearest
            } else {
                scaled.floor()
            };
            if cell < 0.0 || cell >= extent[axis] as f64 {
                return None;
            }
            index[axis] = cell as usize;
        }
        Some(index)
    }

    /// Volume of one voxel in the cube of the voxel-dimension unit
    pub fn voxel_volume(&self) -> f64 {
        self.voxel_dimensions.iter().product()
    }

    pub fn voxel_count(&self) -> usize {
        self.shape.0 * self.shape.1 * self.shape.2
    }
}

/// A named dataset loaded from the atlas
///
/// The first three axes of `raw` are spatial; an optional fourth axis holds
/// per-voxel components.
#[derive(Debug, Clone)]
pub struct VoxelData {
    raw: ArrayD<f64>,
    geometry: VoxelGeometry,
}

impl VoxelData {
    pub fn new(raw: ArrayD<f64>, voxel_dimensions: [f64; 3], offset: [f64; 3]) -> AtlasResult<Self> {
        let shape = raw.shape();
        if shape.len() < 3 || shape.len() > 4 {
            return Err(AtlasError::InvalidData(format!(
                "voxel data must have 3 spatial axes and at most one component axis, got shape {:?}",
                shape
            )));
        }
        let geometry = VoxelGeometry::new((shape[0], shape[1], shape[2]), voxel_dimensions, offset)?;
        Ok(Self { raw, geometry })
    }

    /// Scalar dataset from a 3D array
    pub fn from_scalar(raw: Array3<f64>, geometry: VoxelGeometry) -> AtlasResult<Self> {
        Self::new(raw.into_dyn(), geometry.voxel_dimensions, geometry.offset)
    }

    pub fn raw(&self) -> &ArrayD<f64> {
        &self.raw
    }

    pub fn geometry(&self) -> &VoxelGeometry {
        &self.geometry
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.geometry.shape
    }

    /// Number of per-voxel components (1 for scalar data)
    pub fn components(&self) -> usize {
        self.raw.shape().get(3).copied().unwrap_or(1)
    }

    /// The dataset as a scalar field
    pub fn scalar_field(&self) -> AtlasResult<Array3<f64>> {
        if self.components() != 1 {
            return Err(AtlasError::InvalidData(format!(
                "expected scalar voxel data, found {} components",
                self.components()
            )));
        }
        self.component(0)
    }

    /// One component of the per-voxel data
    pub fn component(&self, component: usize) -> AtlasResult<Array3<f64>> {
        if component >= self.components() {
            return Err(AtlasError::InvalidData(format!(
                "component {} out of range for {} components",
                component,
                self.components()
            )));
        }
        let view = if self.raw.ndim() == 4 {
            self.raw.index_axis(Axis(3), component)
        } else {
            self.raw.view()
        };
        Ok(view.to_owned().into_dimensionality::<Ix3>()?)
    }

    /// Fail with [`AtlasError::ShapeMismatch`] unless the spatial shape matches
    pub fn check_shape(&self, name: &str, expected: (usize, usize, usize)) -> AtlasResult<()> {
        if self.shape() != expected {
            return Err(AtlasError::ShapeMismatch {
                dataset: name.to_string(),
                expected,
                actual: self.raw.shape().to_vec(),
            });
        }
        Ok(())
    }
}
