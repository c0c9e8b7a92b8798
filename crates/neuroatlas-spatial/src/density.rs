// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Cell density lookups by mtype and synapse class.

Density atlases name their files in one of three ways:

| Convention | mtype file | synapse-class file |
|---|---|---|
| `SclassBracketed` | `[EXC]L23_TPC` | `[cell_density]EXC` |
| `LayerPrefixed` | `[cell_density]L2_TPC`, `[cell_density]L3_TPC` | `[cell_density]EXC` |
| `Prefixless` | `L23_TPC` | `EXC` |

The convention is probed once when the atlas opens. A query resolves to a list
of files whose voxel-wise sum is the requested density.
*/

use std::collections::BTreeSet;

use ndarray::{Array3, Zip};
use neuroatlas_config::DensityConfig;
use neuroatlas_structures::{
    AtlasResult, AtlasStore, AtlasWarning, CellQuery, Diagnosed, SpatialQuery, SynapseClass,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::atlas::Atlas;

const CELL_DENSITY_PREFIX: &str = "[cell_density]";

/// µm³ to mm³
const CUBIC_MICRON_TO_MM: f64 = 1e-9;

/// How density datasets are named in an atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DensityConvention {
    SclassBracketed,
    LayerPrefixed,
    Prefixless,
    Unavailable,
}

/// One mtype density file
#[derive(Debug, Clone, PartialEq, Eq)]
struct MtypeFile {
    name: String,
    /// Layer digits, e.g. `23` for `L23_TPC`
    layers: String,
    morphology: String,
    class: SynapseClass,
}

impl DensityConvention {
    /// Detect the naming convention from the dataset names of an atlas
    pub fn probe(files: &BTreeSet<String>) -> AtlasResult<Self> {
        let bracketed = Regex::new(r"^\[(EXC|INH)\]")?;
        let bare_mtype = Regex::new(r"^L\d+_\S+$")?;

        let convention = if files.iter().any(|f| bracketed.is_match(f)) {
            DensityConvention::SclassBracketed
        } else if files.iter().any(|f| f.starts_with(CELL_DENSITY_PREFIX)) {
            DensityConvention::LayerPrefixed
        } else if files
            .iter()
            .any(|f| bare_mtype.is_match(f) || SynapseClass::from_label(f).is_some())
        {
            DensityConvention::Prefixless
        } else {
            DensityConvention::Unavailable
        };
        Ok(convention)
    }

    /// Dataset holding the total density of one synapse class
    fn sclass_file(&self, class: SynapseClass) -> Option<String> {
        match self {
            DensityConvention::SclassBracketed | DensityConvention::LayerPrefixed => {
                Some(format!("{}{}", CELL_DENSITY_PREFIX, class.label()))
            }
            DensityConvention::Prefixless => Some(class.label().to_string()),
            DensityConvention::Unavailable => None,
        }
    }

    fn mtype_files(
        &self,
        files: &BTreeSet<String>,
        config: &DensityConfig,
    ) -> AtlasResult<Vec<MtypeFile>> {
        let pattern = match self {
            DensityConvention::SclassBracketed => r"^\[(EXC|INH)\](L(\d+)_(\S+))$",
            DensityConvention::LayerPrefixed => r"^\[cell_density\]()(L(\d+)_(\S+))$",
            DensityConvention::Prefixless => r"^()(L(\d+)_(\S+))$",
            DensityConvention::Unavailable => return Ok(Vec::new()),
        };
        let regex = Regex::new(pattern)?;

        let mut entries = Vec::new();
        for name in files {
            let Some(caps) = regex.captures(name) else {
                continue;
            };
            let morphology = caps[4].to_string();
            let class = SynapseClass::from_label(&caps[1]).unwrap_or(
                if config.is_excitatory_morphology(&morphology) {
                    SynapseClass::Excitatory
                } else {
                    SynapseClass::Inhibitory
                },
            );
            entries.push(MtypeFile {
                name: name.clone(),
                layers: caps[3].to_string(),
                morphology,
                class,
            });
        }
        Ok(entries)
    }

    /// Datasets whose voxel-wise sum is the density of `query`
    ///
    /// An empty list means the atlas cannot answer the query.
    pub fn dataset_names(
        &self,
        query: &CellQuery,
        files: &BTreeSet<String>,
        config: &DensityConfig,
    ) -> AtlasResult<Vec<String>> {
        let entries = self.mtype_files(files, config)?;
        let class_filter = |entry: &&MtypeFile| query.synapse_class.map_or(true, |c| entry.class == c);

        if let Some(mtype) = &query.mtype {
            let layered = Regex::new(r"^L(\d+)_(\S+)$")?;
            let selected: Vec<&MtypeFile> = match layered.captures(mtype) {
                Some(caps) => {
                    let (digits, morphology) = (&caps[1], &caps[2]);
                    let exact: Vec<&MtypeFile> = entries
                        .iter()
                        .filter(|e| format!("L{}_{}", e.layers, e.morphology) == *mtype)
                        .collect();
                    if !exact.is_empty() {
                        exact
                    } else {
                        // L23_TPC stored as L2_TPC + L3_TPC; every layer must be present
                        let mut split = Vec::new();
                        for digit in digits.chars() {
                            let layer = digit.to_string();
                            let per_layer: Vec<&MtypeFile> = entries
                                .iter()
                                .filter(|e| e.layers == layer && e.morphology == morphology)
                                .collect();
                            if per_layer.is_empty() {
                                debug!("No L{}_{} density file for {}", layer, morphology, mtype);
                                return Ok(Vec::new());
                            }
                            split.extend(per_layer);
                        }
                        split
                    }
                }
                None => entries.iter().filter(|e| e.morphology == *mtype).collect(),
            };
            return Ok(selected
                .into_iter()
                .filter(class_filter)
                .map(|e| e.name.clone())
                .collect());
        }

        let classes: &[SynapseClass] = match &query.synapse_class {
            Some(class) => std::slice::from_ref(class),
            None => &SynapseClass::ALL,
        };
        let mut names = Vec::new();
        for class in classes {
            match self.sclass_file(*class).filter(|name| files.contains(name)) {
                Some(direct) => names.push(direct),
                None => names.extend(
                    entries
                        .iter()
                        .filter(|e| e.class == *class)
                        .map(|e| e.name.clone()),
                ),
            }
        }
        Ok(names)
    }
}

/// Density view over an [`Atlas`]
pub struct CellDensityResolver<'a, S: AtlasStore> {
    atlas: &'a Atlas<S>,
}

impl<'a, S: AtlasStore> CellDensityResolver<'a, S> {
    pub(crate) fn new(atlas: &'a Atlas<S>) -> Self {
        Self { atlas }
    }

    pub fn convention(&self) -> DensityConvention {
        self.atlas.density_convention()
    }

    /// Datasets summed for `query`
    pub fn dataset_names(&self, query: &CellQuery) -> AtlasResult<Vec<String>> {
        self.convention()
            .dataset_names(query, self.atlas.files(), &self.atlas.config().density)
    }

    /// Density field in cells/mm³, NaN where undefined
    ///
    /// An unresolvable filter gives an all-NaN field and a warning. Files that
    /// fail to load or have the wrong shape are skipped with a warning.
    pub fn density(&self, query: &CellQuery) -> AtlasResult<Diagnosed<Array3<f64>>> {
        let shape = self.atlas.geometry().shape;
        let names = self.dataset_names(query)?;
        if names.is_empty() {
            return Ok(Diagnosed::warned(
                Array3::from_elem(shape, f64::NAN),
                AtlasWarning::UnresolvedDensity {
                    filter: query.to_string(),
                },
            ));
        }

        let mut total = Diagnosed::clean(Array3::<f64>::zeros(shape));
        let mut defined = Array3::from_elem(shape, false);
        for name in &names {
            let field = self
                .atlas
                .store()
                .load_data(name)
                .and_then(|data| {
                    data.check_shape(name, shape)?;
                    data.scalar_field()
                });
            match field {
                Ok(values) => {
                    Zip::from(&mut total.value)
                        .and(&mut defined)
                        .and(&values)
                        .for_each(|sum, seen, &v| {
                            if !v.is_nan() {
                                *sum += v;
                                *seen = true;
                            }
                        });
                }
                Err(e) => total.warn(AtlasWarning::MissingDataset {
                    dataset: name.clone(),
                    reason: e.to_string(),
                }),
            }
        }
        Zip::from(&mut total.value)
            .and(&defined)
            .for_each(|sum, &seen| {
                if !seen {
                    *sum = f64::NAN;
                }
            });

        debug!("Density for {} summed from {:?}", query, names);
        Ok(total)
    }

    /// Mean density over the voxels of `spatial`, ignoring NaN
    ///
    /// NaN when the mask is empty or no voxel has a defined density.
    pub fn mean_density(
        &self,
        spatial: &SpatialQuery,
        cell: &CellQuery,
    ) -> AtlasResult<Diagnosed<f64>> {
        let (sum, count, mut result) = self.masked_sum(spatial, cell)?;
        result.value = if count == 0 { f64::NAN } else { sum / count as f64 };
        Ok(result)
    }

    /// Number of cells in the voxels of `spatial`
    ///
    /// Voxel dimensions are µm and densities cells/mm³.
    pub fn cell_count(&self, spatial: &SpatialQuery, cell: &CellQuery) -> AtlasResult<Diagnosed<f64>> {
        let (sum, _, mut result) = self.masked_sum(spatial, cell)?;
        result.value = sum * self.atlas.geometry().voxel_volume() * CUBIC_MICRON_TO_MM;
        Ok(result)
    }

    fn masked_sum(
        &self,
        spatial: &SpatialQuery,
        cell: &CellQuery,
    ) -> AtlasResult<(f64, usize, Diagnosed<f64>)> {
        let mask = self.atlas.masks().get_mask(spatial)?;
        let density = self.density(cell)?;

        let mut sum = 0.0;
        let mut count = 0usize;
        Zip::from(mask.value.as_array())
            .and(&density.value)
            .for_each(|&inside, &v| {
                if inside && !v.is_nan() {
                    sum += v;
                    count += 1;
                }
            });

        let mut result = Diagnosed::clean(0.0);
        result.absorb(&mask.warnings);
        result.absorb(&density.warnings);
        Ok((sum, count, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use neuroatlas_structures::SynapseClass::{Excitatory, Inhibitory};

    fn names(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn resolve(convention: DensityConvention, files: &[&str], query: CellQuery) -> Vec<String> {
        convention
            .dataset_names(&query, &names(files), &DensityConfig::default())
            .unwrap()
    }

    #[test]
    fn test_probe() {
        use DensityConvention::*;
        assert_eq!(DensityConvention::probe(&names(&["[EXC]L23_TPC", "[cell_density]EXC"])).unwrap(), SclassBracketed);
        assert_eq!(DensityConvention::probe(&names(&["[cell_density]L2_TPC"])).unwrap(), LayerPrefixed);
        assert_eq!(DensityConvention::probe(&names(&["L1_DAC", "brain_regions"])).unwrap(), Prefixless);
        assert_eq!(DensityConvention::probe(&names(&["INH"])).unwrap(), Prefixless);
        assert_eq!(DensityConvention::probe(&names(&["brain_regions", "[PH]y"])).unwrap(), Unavailable);
    }

    #[test]
    fn test_bracketed_names() {
        let files = ["[EXC]L23_TPC", "[INH]L23_BP", "[INH]L4_BP", "[cell_density]INH"];
        let conv = DensityConvention::SclassBracketed;

        assert_eq!(resolve(conv, &files, CellQuery::mtype("L23_TPC")), vec!["[EXC]L23_TPC"]);
        // Morphology without layer prefix spans layers
        assert_eq!(
            resolve(conv, &files, CellQuery::mtype("BP")),
            vec!["[INH]L23_BP", "[INH]L4_BP"]
        );
        assert_eq!(
            resolve(conv, &files, CellQuery::synapse_class(Inhibitory)),
            vec!["[cell_density]INH"]
        );
        // No direct EXC file: sum of excitatory mtypes
        assert_eq!(
            resolve(conv, &files, CellQuery::synapse_class(Excitatory)),
            vec!["[EXC]L23_TPC"]
        );
    }

    #[test]
    fn test_layer_prefixed_splits_layers() {
        let files = [
            "[cell_density]L2_TPC",
            "[cell_density]L3_TPC",
            "[cell_density]L5_TPC:A",
            "[cell_density]L1_DAC",
        ];
        let conv = DensityConvention::LayerPrefixed;

        assert_eq!(
            resolve(conv, &files, CellQuery::mtype("L23_TPC")),
            vec!["[cell_density]L2_TPC", "[cell_density]L3_TPC"]
        );
        assert_eq!(
            resolve(conv, &files, CellQuery::mtype("L5_TPC:A")),
            vec!["[cell_density]L5_TPC:A"]
        );
        // TPC:A is excitatory by its base morphology
        let exc = resolve(conv, &files, CellQuery::synapse_class(Excitatory));
        assert_eq!(exc.len(), 3);
        assert_eq!(
            resolve(conv, &files, CellQuery::synapse_class(Inhibitory)),
            vec!["[cell_density]L1_DAC"]
        );
    }

    #[test]
    fn test_partial_layer_split_is_unresolved() {
        let files = ["[cell_density]L2_TPC", "[cell_density]L1_DAC"];
        let conv = DensityConvention::LayerPrefixed;
        assert!(resolve(conv, &files, CellQuery::mtype("L23_TPC")).is_empty());
        assert_eq!(
            resolve(conv, &files, CellQuery::mtype("L2_TPC")),
            vec!["[cell_density]L2_TPC"]
        );
    }

    #[test]
    fn test_mtype_with_class_filter() {
        let files = ["[EXC]L4_SS", "[INH]L4_SS"];
        let query = CellQuery {
            mtype: Some("L4_SS".to_string()),
            synapse_class: Some(Inhibitory),
        };
        assert_eq!(resolve(DensityConvention::SclassBracketed, &files, query), vec!["[INH]L4_SS"]);
    }

    #[test]
    fn test_no_filter_is_total() {
        let files = ["EXC", "INH", "L1_DAC"];
        assert_eq!(
            resolve(DensityConvention::Prefixless, &files, CellQuery::default()),
            vec!["EXC", "INH"]
        );
    }

    #[test]
    fn test_density_sum_and_nan_handling() {
        let atlas = fixtures::density_atlas(DensityConvention::LayerPrefixed);
        let densities = atlas.densities();

        let l23 = densities.density(&CellQuery::mtype("L23_TPC")).unwrap();
        assert!(l23.is_clean());
        // L2 file 100 + L3 file 200 inside the brain
        assert_eq!(l23.value[[0, 3, 0]], 300.0);
        // Both contributors NaN outside the brain
        assert!(l23.value[[0, 3, 2]].is_nan());
    }

    #[test]
    fn test_missing_split_layer_is_nan_not_partial_sum() {
        let mut store = fixtures::density_store(DensityConvention::LayerPrefixed);
        store.remove_dataset("[cell_density]L3_TPC");
        let atlas = Atlas::with_defaults(store).unwrap();

        let l23 = atlas.densities().density(&CellQuery::mtype("L23_TPC")).unwrap();
        assert!(l23.value.iter().all(|v| v.is_nan()));
        assert_eq!(l23.warnings.len(), 1);
        assert!(matches!(l23.warnings[0], AtlasWarning::UnresolvedDensity { .. }));
    }

    #[test]
    fn test_unresolved_filter_is_nan_with_warning() {
        let atlas = fixtures::density_atlas(DensityConvention::LayerPrefixed);
        let density = atlas.densities().density(&CellQuery::mtype("L6_BPC")).unwrap();
        assert!(density.value.iter().all(|v| v.is_nan()));
        assert!(matches!(density.warnings[0], AtlasWarning::UnresolvedDensity { .. }));
    }

    #[test]
    fn test_unavailable_densities() {
        let atlas = fixtures::full_layer_atlas();
        assert_eq!(atlas.densities().convention(), DensityConvention::Unavailable);
        let density = atlas.densities().density(&CellQuery::default()).unwrap();
        assert_eq!(density.warnings.len(), 1);
    }

    #[test]
    fn test_mean_and_count() {
        let atlas = fixtures::density_atlas(DensityConvention::Prefixless);
        let densities = atlas.densities();
        let spatial = SpatialQuery::new().region("SSp-ll");
        let cell = CellQuery::mtype("L1_DAC");

        let mean = densities.mean_density(&spatial, &cell).unwrap();
        assert_eq!(mean.value, fixtures::L1_DAC_DENSITY);

        // 12 voxels of 10 µm³ cubed
        let count = densities.cell_count(&spatial, &cell).unwrap();
        let expected = fixtures::L1_DAC_DENSITY * 12.0 * 1000.0 * 1e-9;
        assert!((count.value - expected).abs() < 1e-12);

        let empty = densities
            .mean_density(&SpatialQuery::new().region("MOp"), &cell)
            .unwrap();
        assert!(empty.value.is_nan());
        assert_eq!(empty.warnings.len(), 1);
    }
}
