// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Per-voxel depth, height and thickness along the principal axis.

The atlas provides one axis-position dataset and, per layer of the configured
bottom→top stack, a boundary dataset whose trailing axis holds
`(bottom, top)`. Everything else is derived:

```text
global_top      = top(topmost layer)
global_bottom   = bottom(bottommost layer)
height          = axis_position - global_bottom
depth           = global_top - axis_position
thickness(L)    = top(L) - bottom(L)
total_thickness = global_top - global_bottom
relative_*      = * / total_thickness
```

Each field is computed once per atlas and cached. Undefined data is NaN;
missing or mis-shaped datasets produce an all-NaN field and a warning that
is replayed with every access of the field.
*/

use ahash::AHashMap;
use ndarray::{Array3, Zip};
use neuroatlas_structures::{
    AtlasError, AtlasResult, AtlasStore, AtlasWarning, Diagnosed, VoxelData,
};
use once_cell::sync::OnceCell;
use tracing::debug;

use crate::atlas::Atlas;

type Field = Diagnosed<Array3<f64>>;

/// Bottom and top boundary of one layer at every voxel
#[derive(Debug, Clone)]
pub struct Interval {
    pub bottom: Array3<f64>,
    pub top: Array3<f64>,
}

#[derive(Default)]
struct LayerCache {
    interval: OnceCell<Diagnosed<Interval>>,
    thickness: OnceCell<Field>,
}

/// Compute-once cells for every principal-axis field of one atlas
#[derive(Default)]
pub(crate) struct AxisCache {
    position: OnceCell<Field>,
    layers: AHashMap<String, LayerCache>,
    global_top: OnceCell<Field>,
    global_bottom: OnceCell<Field>,
    height: OnceCell<Field>,
    depth: OnceCell<Field>,
    total_thickness: OnceCell<Field>,
    relative_height: OnceCell<Field>,
    relative_depth: OnceCell<Field>,
}

impl AxisCache {
    pub(crate) fn new(stack: &[String]) -> Self {
        Self {
            layers: stack
                .iter()
                .map(|layer| (layer.clone(), LayerCache::default()))
                .collect(),
            ..Default::default()
        }
    }
}

/// Principal-axis view over an [`Atlas`]
pub struct PrincipalAxis<'a, S: AtlasStore> {
    atlas: &'a Atlas<S>,
}

impl<'a, S: AtlasStore> PrincipalAxis<'a, S> {
    pub(crate) fn new(atlas: &'a Atlas<S>) -> Self {
        Self { atlas }
    }

    fn cache(&self) -> &'a AxisCache {
        &self.atlas.axis
    }

    fn nan_field(&self) -> Array3<f64> {
        Array3::from_elem(self.atlas.geometry().shape, f64::NAN)
    }

    /// Load a dataset with the atlas shape; `None` plus a warning otherwise
    fn load<T>(&self, name: &str, diagnosed: &mut Diagnosed<T>) -> Option<VoxelData> {
        let loaded = self
            .atlas
            .store()
            .load_data(name)
            .and_then(|data| data.check_shape(name, self.atlas.geometry().shape).map(|_| data));
        match loaded {
            Ok(data) => Some(data),
            Err(e) => {
                diagnosed.warn(AtlasWarning::MissingDataset {
                    dataset: name.to_string(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    /// Position of every voxel along the principal axis
    pub fn axis_position(&self) -> &'a Field {
        self.cache().position.get_or_init(|| {
            let name = &self.atlas.config().principal_axis.position_dataset;
            let mut field = Diagnosed::clean(self.nan_field());
            if let Some(data) = self.load(name, &mut field) {
                match data.scalar_field() {
                    Ok(values) => field.value = values,
                    Err(e) => field.warn(AtlasWarning::MissingDataset {
                        dataset: name.clone(),
                        reason: e.to_string(),
                    }),
                }
            }
            debug!("Cached principal-axis position from {}", name);
            field
        })
    }

    fn layer_cache(&self, layer: &str) -> AtlasResult<&'a LayerCache> {
        self.cache()
            .layers
            .get(layer)
            .ok_or_else(|| AtlasError::UnknownLayer(layer.to_string()))
    }

    /// Boundary interval of a layer of the configured stack
    ///
    /// # Errors
    ///
    /// [`AtlasError::UnknownLayer`] for a layer outside the stack.
    pub fn interval(&self, layer: &str) -> AtlasResult<&'a Diagnosed<Interval>> {
        let cache = self.layer_cache(layer)?;
        Ok(cache.interval.get_or_init(|| self.load_interval(layer)))
    }

    fn load_interval(&self, layer: &str) -> Diagnosed<Interval> {
        let name = self.atlas.config().principal_axis.boundary_dataset(layer);
        let mut interval = Diagnosed::clean(Interval {
            bottom: self.nan_field(),
            top: self.nan_field(),
        });

        if let Some(data) = self.load(&name, &mut interval) {
            let parts = if data.components() == 2 {
                data.component(0).and_then(|bottom| Ok((bottom, data.component(1)?)))
            } else {
                Err(AtlasError::InvalidData(format!(
                    "expected (bottom, top) components, found {}",
                    data.components()
                )))
            };
            match parts {
                Ok((bottom, top)) => {
                    interval.value.bottom = bottom;
                    interval.value.top = top;
                }
                Err(e) => interval.warn(AtlasWarning::MissingDataset {
                    dataset: name.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        let mut inverted = 0usize;
        let Interval { bottom, top } = &mut interval.value;
        Zip::from(bottom).and(top).for_each(|bottom, top| {
            if bottom.is_finite() && top.is_finite() && *top < *bottom {
                *bottom = f64::NAN;
                *top = f64::NAN;
                inverted += 1;
            }
        });
        if inverted > 0 {
            interval.warn(AtlasWarning::InvertedInterval {
                layer: layer.to_string(),
                voxels: inverted,
            });
        }

        debug!("Cached boundary interval of {} from {}", layer, name);
        interval
    }

    fn stack_end(&self, end: Option<&str>) -> AtlasResult<String> {
        end.map(str::to_string)
            .ok_or_else(|| AtlasError::InvalidData("layer stack is empty".to_string()))
    }

    /// `top` of the topmost layer
    pub fn global_top(&self) -> AtlasResult<&'a Field> {
        let top_layer = self.stack_end(self.atlas.config().layers.top())?;
        let interval = self.interval(&top_layer)?;
        Ok(self
            .cache()
            .global_top
            .get_or_init(|| interval.clone().map(|i| i.top)))
    }

    /// `bottom` of the bottommost layer
    pub fn global_bottom(&self) -> AtlasResult<&'a Field> {
        let bottom_layer = self.stack_end(self.atlas.config().layers.bottom())?;
        let interval = self.interval(&bottom_layer)?;
        Ok(self
            .cache()
            .global_bottom
            .get_or_init(|| interval.clone().map(|i| i.bottom)))
    }

    /// Distance above the local bottom of the layer stack
    pub fn height(&self) -> AtlasResult<&'a Field> {
        let bottom = self.global_bottom()?;
        let position = self.axis_position();
        Ok(self
            .cache()
            .height
            .get_or_init(|| combine(position, bottom, |p, b| p - b)))
    }

    /// Distance below the local top of the layer stack
    pub fn depth(&self) -> AtlasResult<&'a Field> {
        let top = self.global_top()?;
        let position = self.axis_position();
        Ok(self
            .cache()
            .depth
            .get_or_init(|| combine(top, position, |t, p| t - p)))
    }

    /// Thickness of one layer
    ///
    /// # Errors
    ///
    /// [`AtlasError::UnknownLayer`] for a layer outside the stack.
    pub fn thickness(&self, layer: &str) -> AtlasResult<&'a Field> {
        let cache = self.layer_cache(layer)?;
        let interval = self.interval(layer)?;
        Ok(cache.thickness.get_or_init(|| {
            let mut field = Diagnosed::clean(&interval.value.top - &interval.value.bottom);
            field.absorb(&interval.warnings);
            field
        }))
    }

    /// Thickness of the whole layer stack
    pub fn total_thickness(&self) -> AtlasResult<&'a Field> {
        let top = self.global_top()?;
        let bottom = self.global_bottom()?;
        Ok(self
            .cache()
            .total_thickness
            .get_or_init(|| combine(top, bottom, |t, b| t - b)))
    }

    /// `height / total_thickness`
    pub fn relative_height(&self) -> AtlasResult<&'a Field> {
        let height = self.height()?;
        let total = self.total_thickness()?;
        Ok(self
            .cache()
            .relative_height
            .get_or_init(|| combine(height, total, |h, t| h / t)))
    }

    /// `depth / total_thickness`
    pub fn relative_depth(&self) -> AtlasResult<&'a Field> {
        let depth = self.depth()?;
        let total = self.total_thickness()?;
        Ok(self
            .cache()
            .relative_depth
            .get_or_init(|| combine(depth, total, |d, t| d / t)))
    }
}

/// Elementwise combination; warnings of both inputs carry over
fn combine(a: &Field, b: &Field, op: impl Fn(f64, f64) -> f64) -> Field {
    let mut values = a.value.clone();
    Zip::from(&mut values)
        .and(&b.value)
        .for_each(|x, &y| *x = op(*x, y));
    let mut field = Diagnosed::clean(values);
    field.absorb(&a.warnings);
    for warning in &b.warnings {
        if !field.warnings.contains(warning) {
            field.warnings.push(warning.clone());
        }
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use ndarray::Array4;

    #[test]
    fn test_fixture_profile() {
        let atlas = fixtures::full_layer_atlas();
        let axis = atlas.principal_axis();

        let height = axis.height().unwrap();
        let depth = axis.depth().unwrap();
        assert!(height.is_clean());
        // y = 2 is L4, centred at 25 above the bottom of L6
        assert_eq!(height.value[[0, 2, 0]], 25.0);
        assert_eq!(depth.value[[0, 2, 0]], 35.0);
        assert_eq!(axis.total_thickness().unwrap().value[[1, 5, 1]], 60.0);
        assert_eq!(axis.thickness("L4").unwrap().value[[0, 2, 0]], 10.0);
        assert!((axis.relative_depth().unwrap().value[[0, 0, 0]] - 55.0 / 60.0).abs() < 1e-12);

        // Outside the brain everything is undefined
        assert!(height.value[[0, 0, 2]].is_nan());
    }

    #[test]
    fn test_fields_are_cached() {
        let atlas = fixtures::full_layer_atlas();
        let first = atlas.principal_axis().height().unwrap() as *const Field;
        let second = atlas.principal_axis().height().unwrap() as *const Field;
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_layer_is_error() {
        let atlas = fixtures::full_layer_atlas();
        let err = atlas.principal_axis().thickness("L7").unwrap_err();
        assert!(matches!(err, AtlasError::UnknownLayer(l) if l == "L7"));
    }

    #[test]
    fn test_missing_boundary_degrades_to_nan() {
        let mut store = fixtures::full_layer_store();
        store.remove_dataset("[PH]L1");
        let atlas = Atlas::with_defaults(store).unwrap();

        let depth = atlas.principal_axis().depth().unwrap();
        assert!(depth.value.iter().all(|v| v.is_nan()));
        assert_eq!(depth.warnings.len(), 1);
        assert!(matches!(
            &depth.warnings[0],
            AtlasWarning::MissingDataset { dataset, .. } if dataset == "[PH]L1"
        ));

        // Height does not depend on L1
        assert!(atlas.principal_axis().height().unwrap().is_clean());
        // Warnings replay on every access
        assert_eq!(atlas.principal_axis().depth().unwrap().warnings.len(), 1);
    }

    #[test]
    fn test_wrong_component_count_degrades() {
        let mut store = fixtures::full_layer_store();
        let scalar = VoxelData::from_scalar(
            Array3::zeros(fixtures::SHAPE),
            fixtures::geometry(),
        )
        .unwrap();
        store.insert_dataset("[PH]L3", scalar);
        let atlas = Atlas::with_defaults(store).unwrap();

        let thickness = atlas.principal_axis().thickness("L3").unwrap();
        assert!(thickness.value.iter().all(|v| v.is_nan()));
        assert_eq!(thickness.warnings.len(), 1);
    }

    #[test]
    fn test_inverted_interval_is_nan_with_one_warning() {
        let mut store = fixtures::full_layer_store();
        let (nx, ny, nz) = fixtures::SHAPE;
        let mut raw = Array4::<f64>::zeros((nx, ny, nz, 2));
        for x in 0..nx {
            for y in 0..ny {
                for z in 0..nz {
                    raw[[x, y, z, 0]] = 30.0;
                    raw[[x, y, z, 1]] = if x == 0 { 20.0 } else { 40.0 };
                }
            }
        }
        let data = VoxelData::new(raw.into_dyn(), [10.0; 3], [0.0; 3]).unwrap();
        store.insert_dataset("[PH]L3", data);
        let atlas = Atlas::with_defaults(store).unwrap();

        let interval = atlas.principal_axis().interval("L3").unwrap();
        assert_eq!(interval.warnings.len(), 1);
        assert!(matches!(
            interval.warnings[0],
            AtlasWarning::InvertedInterval { voxels, .. } if voxels == ny * nz
        ));
        assert!(interval.value.top[[0, 0, 0]].is_nan());
        assert!(interval.value.bottom[[0, 0, 0]].is_nan());
        assert_eq!(interval.value.top[[1, 0, 0]], 40.0);
    }
}
