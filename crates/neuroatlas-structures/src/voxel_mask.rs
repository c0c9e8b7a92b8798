// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Boolean voxel masks and their set algebra.

use ndarray::{Array3, Zip};

use crate::error::{AtlasError, AtlasResult};
use crate::voxel_data::VoxelIndex;

/// Boolean array over the atlas voxel grid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelMask {
    data: Array3<bool>,
}

impl VoxelMask {
    pub fn new(data: Array3<bool>) -> Self {
        Self { data }
    }

    pub fn filled(shape: (usize, usize, usize), value: bool) -> Self {
        Self {
            data: Array3::from_elem(shape, value),
        }
    }

    /// Mask of voxels whose scalar value satisfies `predicate`
    pub fn from_field(field: &Array3<f64>, predicate: impl Fn(f64) -> bool) -> Self {
        Self {
            data: field.mapv(predicate),
        }
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn as_array(&self) -> &Array3<bool> {
        &self.data
    }

    pub fn into_array(self) -> Array3<bool> {
        self.data
    }

    pub fn get(&self, index: VoxelIndex) -> Option<bool> {
        self.data.get(index).copied()
    }

    /// Number of set voxels
    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.data.iter().any(|&v| v)
    }

    /// Set voxel indices in row-major order
    pub fn indices(&self) -> Vec<VoxelIndex> {
        self.data
            .indexed_iter()
            .filter(|(_, &v)| v)
            .map(|((i, j, k), _)| [i, j, k])
            .collect()
    }

    fn check_same_shape(&self, other: &VoxelMask) -> AtlasResult<()> {
        if self.shape() != other.shape() {
            return Err(AtlasError::ShapeMismatch {
                dataset: "voxel mask".to_string(),
                expected: self.shape(),
                actual: vec![other.shape().0, other.shape().1, other.shape().2],
            });
        }
        Ok(())
    }

    /// In-place intersection
    pub fn and_assign(&mut self, other: &VoxelMask) -> AtlasResult<()> {
        self.check_same_shape(other)?;
        Zip::from(&mut self.data)
            .and(&other.data)
            .for_each(|a, &b| *a = *a && b);
        Ok(())
    }

    /// In-place union
    pub fn or_assign(&mut self, other: &VoxelMask) -> AtlasResult<()> {
        self.check_same_shape(other)?;
        Zip::from(&mut self.data)
            .and(&other.data)
            .for_each(|a, &b| *a = *a || b);
        Ok(())
    }

    pub fn and(&self, other: &VoxelMask) -> AtlasResult<VoxelMask> {
        let mut out = self.clone();
        out.and_assign(other)?;
        Ok(out)
    }

    pub fn or(&self, other: &VoxelMask) -> AtlasResult<VoxelMask> {
        let mut out = self.clone();
        out.or_assign(other)?;
        Ok(out)
    }

    /// Voxels of `universe` not in this mask
    pub fn complement_within(&self, universe: &VoxelMask) -> AtlasResult<VoxelMask> {
        self.check_same_shape(universe)?;
        let mut data = universe.data.clone();
        Zip::from(&mut data)
            .and(&self.data)
            .for_each(|u, &m| *u = *u && !m);
        Ok(VoxelMask { data })
    }
}

impl From<Array3<bool>> for VoxelMask {
    fn from(data: Array3<bool>) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripes(axis_value: usize) -> VoxelMask {
        VoxelMask::new(Array3::from_shape_fn((3, 3, 2), |(i, _, _)| i == axis_value))
    }

    #[test]
    fn test_counts_and_indices() {
        let m = stripes(1);
        assert_eq!(m.count(), 6);
        assert!(!m.is_empty());
        assert_eq!(m.indices()[0], [1, 0, 0]);
        assert!(VoxelMask::filled((2, 2, 2), false).is_empty());
    }

    #[test]
    fn test_set_algebra() {
        let a = stripes(0);
        let b = stripes(1);
        assert_eq!(a.and(&b).unwrap().count(), 0);
        assert_eq!(a.or(&b).unwrap().count(), 12);

        let all = VoxelMask::filled((3, 3, 2), true);
        let rest = a.or(&b).unwrap().complement_within(&all).unwrap();
        assert_eq!(rest, stripes(2));
    }

    #[test]
    fn test_shape_mismatch() {
        let mut a = VoxelMask::filled((2, 2, 2), true);
        let b = VoxelMask::filled((2, 2, 3), true);
        assert!(a.and_assign(&b).is_err());
    }

    #[test]
    fn test_from_field_nan_is_false() {
        let field = Array3::from_shape_vec((1, 1, 3), vec![1.0, f64::NAN, 3.0]).unwrap();
        let m = VoxelMask::from_field(&field, |v| (0.0..2.0).contains(&v));
        assert_eq!(m.get([0, 0, 0]), Some(true));
        assert_eq!(m.get([0, 0, 1]), Some(false));
        assert_eq!(m.get([0, 0, 2]), Some(false));
    }
}
