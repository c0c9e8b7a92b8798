// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Boolean voxel masks for spatial queries.

Every populated query field becomes one component mask and the components are
ANDed onto the valid-voxel mask. Within a field the listed values are ORed.
An acronym the atlas lacks gives an all-false component and a warning, never
an error. Whether a value exists is decided on region ids through
[`resolve_ids`]; the voxels come from the store's native masks. A region and
a layer that both exist but share no ids also warn.
*/

use neuroatlas_structures::{
    AtlasError, AtlasResult, AtlasStore, AtlasWarning, AxisConstraint, Diagnosed, SpatialQuery,
    VoxelMask,
};
use tracing::debug;

use crate::atlas::Atlas;
use crate::convention::{layer_query_pattern, region_acronym, resolve_ids, ConventionProfile};

/// Mask composition over an [`Atlas`]
pub struct MaskEngine<'a, S: AtlasStore> {
    atlas: &'a Atlas<S>,
}

impl<'a, S: AtlasStore> MaskEngine<'a, S> {
    pub(crate) fn new(atlas: &'a Atlas<S>) -> Self {
        Self { atlas }
    }

    /// Voxels with a non-zero region label
    pub fn valid_mask(&self) -> &'a VoxelMask {
        self.atlas.valid_mask()
    }

    /// Native mask of one acronym or `@`-pattern, limited to valid voxels
    pub fn region_mask(&self, acronym_or_pattern: &str) -> AtlasResult<Diagnosed<VoxelMask>> {
        let mut mask = Diagnosed::clean(self.valid_mask().clone());
        if self.atlas.hierarchy().find_acronym(acronym_or_pattern)?.is_empty() {
            mask.value = VoxelMask::filled(self.atlas.geometry().shape, false);
            mask.warn(AtlasWarning::UnknownRegion {
                region: acronym_or_pattern.to_string(),
            });
        } else {
            mask.value.and_assign(&self.store_mask(acronym_or_pattern)?)?;
        }
        Ok(mask)
    }

    /// Mask of every valid voxel satisfying `query`
    ///
    /// # Errors
    ///
    /// [`AtlasError::ConflictingAxis`] when both depth and height are given;
    /// [`AtlasError::UnresolvedConvention`] when the atlas naming cannot be
    /// detected; store failures.
    pub fn get_mask(&self, query: &SpatialQuery) -> AtlasResult<Diagnosed<VoxelMask>> {
        if query.depth.is_some() && query.height.is_some() {
            return Err(AtlasError::ConflictingAxis);
        }

        let mut result = Diagnosed::clean(self.valid_mask().clone());
        if query.is_unconstrained() {
            return Ok(result);
        }
        let profile = self.atlas.convention()?;

        if let Some(regions) = &query.region {
            let component = self.region_component(&profile, regions)?;
            self.merge(&mut result, component)?;
        }
        if let Some(layers) = &query.layer {
            let component = self.layer_component(&profile, layers)?;
            self.merge(&mut result, component)?;
        }
        if let (Some(regions), Some(layers)) = (&query.region, &query.layer) {
            if let Some(warning) = self.disjoint_warning(&profile, regions, layers)? {
                result.warn(warning);
            }
        }
        if let Some(columns) = &query.column {
            if profile.supports_columns() {
                let component = self.column_component(&profile, columns)?;
                self.merge(&mut result, component)?;
            } else {
                result.warn(AtlasWarning::ColumnsUnsupported {
                    columns: columns.clone(),
                });
            }
        }
        if let Some(depth) = &query.depth {
            let component = self.axis_component(depth, true)?;
            self.merge(&mut result, component)?;
        }
        if let Some(height) = &query.height {
            let component = self.axis_component(height, false)?;
            self.merge(&mut result, component)?;
        }

        debug!(
            "Mask for {:?}: {} voxels, {} warnings",
            query,
            result.value.count(),
            result.warnings.len()
        );
        Ok(result)
    }

    /// Number of voxels in the mask of `query`
    pub fn voxel_count(&self, query: &SpatialQuery) -> AtlasResult<Diagnosed<usize>> {
        Ok(self.get_mask(query)?.map(|mask| mask.count()))
    }

    fn merge(
        &self,
        result: &mut Diagnosed<VoxelMask>,
        component: Diagnosed<VoxelMask>,
    ) -> AtlasResult<()> {
        result.value.and_assign(&component.value)?;
        result.absorb(&component.warnings);
        Ok(())
    }

    /// Store mask of an acronym or pattern known to the hierarchy
    fn store_mask(&self, acronym_or_pattern: &str) -> AtlasResult<VoxelMask> {
        let raw = self.atlas.store().get_region_mask(acronym_or_pattern)?;
        let expected = self.atlas.geometry().shape;
        if raw.dim() != expected {
            return Err(AtlasError::ShapeMismatch {
                dataset: acronym_or_pattern.to_string(),
                expected,
                actual: raw.shape().to_vec(),
            });
        }
        Ok(VoxelMask::new(raw))
    }

    /// Mask of a logical region or column, `None` if it resolves to no ids
    fn named_mask(&self, profile: &ConventionProfile, name: &str) -> AtlasResult<Option<VoxelMask>> {
        let hierarchy = self.atlas.hierarchy();
        if resolve_ids(profile, hierarchy, Some(name), None)?.is_empty() {
            return Ok(None);
        }
        match region_acronym(profile, hierarchy, name) {
            Some(acronym) => Ok(Some(self.store_mask(&acronym)?)),
            None => Ok(None),
        }
    }

    /// Warning when every known region/layer pair resolves to no ids
    fn disjoint_warning(
        &self,
        profile: &ConventionProfile,
        regions: &[String],
        layers: &[String],
    ) -> AtlasResult<Option<AtlasWarning>> {
        let hierarchy = self.atlas.hierarchy();
        let mut known_pair = false;
        for region in regions {
            if resolve_ids(profile, hierarchy, Some(region.as_str()), None)?.is_empty() {
                continue;
            }
            for layer in layers {
                if resolve_ids(profile, hierarchy, None, Some(layer.as_str()))?.is_empty() {
                    continue;
                }
                known_pair = true;
                let shared =
                    resolve_ids(profile, hierarchy, Some(region.as_str()), Some(layer.as_str()))?;
                if !shared.is_empty() {
                    return Ok(None);
                }
            }
        }
        Ok(known_pair.then(|| AtlasWarning::DisjointRegionLayer {
            regions: regions.to_vec(),
            layers: layers.to_vec(),
        }))
    }

    fn empty(&self) -> Diagnosed<VoxelMask> {
        Diagnosed::clean(VoxelMask::filled(self.atlas.geometry().shape, false))
    }

    fn region_component(
        &self,
        profile: &ConventionProfile,
        regions: &[String],
    ) -> AtlasResult<Diagnosed<VoxelMask>> {
        let mut component = self.empty();
        for region in regions {
            match self.named_mask(profile, region)? {
                Some(mask) => component.value.or_assign(&mask)?,
                None => component.warn(AtlasWarning::UnknownRegion {
                    region: region.clone(),
                }),
            }
        }
        Ok(component)
    }

    fn layer_component(
        &self,
        profile: &ConventionProfile,
        layers: &[String],
    ) -> AtlasResult<Diagnosed<VoxelMask>> {
        let mut component = self.empty();
        let hierarchy = self.atlas.hierarchy();
        for layer in layers {
            let pattern = layer_query_pattern(profile, layer);
            if resolve_ids(profile, hierarchy, None, Some(layer.as_str()))?.is_empty() {
                component.warn(AtlasWarning::UnknownLayer {
                    layer: layer.clone(),
                    pattern,
                });
            } else {
                component.value.or_assign(&self.store_mask(&pattern)?)?;
            }
        }
        Ok(component)
    }

    fn column_component(
        &self,
        profile: &ConventionProfile,
        columns: &[String],
    ) -> AtlasResult<Diagnosed<VoxelMask>> {
        let mut component = self.empty();
        for column in columns {
            match self.named_mask(profile, column)? {
                Some(mask) => component.value.or_assign(&mask)?,
                None => component.warn(AtlasWarning::UnknownColumn {
                    column: column.clone(),
                }),
            }
        }
        Ok(component)
    }

    fn axis_component(
        &self,
        constraint: &AxisConstraint,
        is_depth: bool,
    ) -> AtlasResult<Diagnosed<VoxelMask>> {
        let axis = self.atlas.principal_axis();
        let field = match (is_depth, constraint.relative) {
            (true, false) => axis.depth()?,
            (true, true) => axis.relative_depth()?,
            (false, false) => axis.height()?,
            (false, true) => axis.relative_height()?,
        };
        let mut component = Diagnosed::clean(VoxelMask::from_field(&field.value, |v| {
            constraint.contains(v)
        }));
        component.absorb(&field.warnings);
        Ok(component)
    }
}
