// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
The opened-atlas handle.

An [`Atlas`] owns its store, the region hierarchy and the valid-voxel mask, and
memoizes everything derived from them (naming convention, principal-axis
fields). The handle is read-only after open; caches fill on first use and are
never invalidated.
*/

use std::collections::BTreeSet;

use neuroatlas_config::{validate_config, AtlasConfig};
use neuroatlas_structures::{
    AtlasError, AtlasResult, AtlasStore, RegionHierarchy, VoxelGeometry, VoxelMask,
};
use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::convention::{self, ConventionProfile};
use crate::density::{CellDensityResolver, DensityConvention};
use crate::masks::MaskEngine;
use crate::principal_axis::{AxisCache, PrincipalAxis};

/// A volumetric atlas opened for querying
pub struct Atlas<S: AtlasStore> {
    store: S,
    config: AtlasConfig,
    hierarchy: RegionHierarchy,
    geometry: VoxelGeometry,
    valid: VoxelMask,
    files: BTreeSet<String>,
    density_convention: DensityConvention,
    convention: OnceCell<ConventionProfile>,
    pub(crate) axis: AxisCache,
}

impl<S: AtlasStore> Atlas<S> {
    /// Open an atlas: load the hierarchy and label volume, probe density files
    ///
    /// # Errors
    ///
    /// Store failures, a label dataset that is not scalar, or an invalid
    /// configuration.
    pub fn open(store: S, config: AtlasConfig) -> AtlasResult<Self> {
        validate_config(&config).map_err(|e| AtlasError::Config(e.to_string()))?;

        let hierarchy = store.load_region_map()?;
        let labels_name = config.atlas.brain_regions_dataset.as_str();
        let labels = store.load_data(labels_name)?;
        let geometry = *labels.geometry();
        let valid = VoxelMask::from_field(&labels.scalar_field()?, |label| {
            label.is_finite() && label != 0.0
        });

        let files = store.list_files()?;
        let density_convention = DensityConvention::probe(&files)?;

        info!(
            "Opened atlas: {} regions, grid {:?}, {} valid voxels, density files {:?}",
            hierarchy.region_count(),
            geometry.shape,
            valid.count(),
            density_convention
        );

        let axis = AxisCache::new(&config.layers.stack);
        Ok(Self {
            store,
            config,
            hierarchy,
            geometry,
            valid,
            files,
            density_convention,
            convention: OnceCell::new(),
            axis,
        })
    }

    /// Open with the default configuration
    pub fn with_defaults(store: S) -> AtlasResult<Self> {
        Self::open(store, AtlasConfig::default())
    }

    /// Naming convention of this atlas, detected on first call
    ///
    /// # Errors
    ///
    /// [`AtlasError::UnresolvedConvention`] if no layer family applies. A
    /// failed detection is not cached.
    pub fn convention(&self) -> AtlasResult<ConventionProfile> {
        self.convention
            .get_or_try_init(|| convention::detect(&self.hierarchy))
            .copied()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    pub fn hierarchy(&self) -> &RegionHierarchy {
        &self.hierarchy
    }

    pub fn geometry(&self) -> &VoxelGeometry {
        &self.geometry
    }

    /// Voxels with a non-zero region label
    pub fn valid_mask(&self) -> &VoxelMask {
        &self.valid
    }

    /// Dataset names present in the store at open time
    pub fn files(&self) -> &BTreeSet<String> {
        &self.files
    }

    pub fn density_convention(&self) -> DensityConvention {
        self.density_convention
    }

    /// Random stream for sampling, seeded from `sampling.seed` when configured
    pub fn rng(&self) -> StdRng {
        match self.config.sampling.seed {
            Some(seed) => {
                debug!("Seeding sampler with {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        }
    }

    pub fn masks(&self) -> MaskEngine<'_, S> {
        MaskEngine::new(self)
    }

    pub fn principal_axis(&self) -> PrincipalAxis<'_, S> {
        PrincipalAxis::new(self)
    }

    pub fn densities(&self) -> CellDensityResolver<'_, S> {
        CellDensityResolver::new(self)
    }
}

impl<S: AtlasStore> std::fmt::Debug for Atlas<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Atlas")
            .field("regions", &self.hierarchy.region_count())
            .field("geometry", &self.geometry)
            .field("convention", &self.convention.get())
            .field("density_convention", &self.density_convention)
            .finish()
    }
}
