// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests against an atlas assembled from a JSON hierarchy
//!
//! A single column of barrel-cortex voxels, Blue Brain acronyms (`SSp-bfd1`,
//! `SSp-bfd6a`), no density files.

use ndarray::{Array3, Array4};
use neuroatlas_config::AtlasConfig;
use neuroatlas_spatial::{Atlas, DensityConvention, LayerConvention, RegionConvention};
use neuroatlas_structures::{
    AtlasError, AxisConstraint, InMemoryAtlasStore, RegionHierarchy, SpatialQuery, VoxelData,
};
use proptest::prelude::*;

const HIERARCHY_JSON: &str = r#"{
  "msg": [{
    "id": 1, "acronym": "root", "name": "root",
    "children": [{
      "id": 329, "acronym": "SSp-bfd", "name": "Primary somatosensory area, barrel field",
      "children": [
        {"id": 981, "acronym": "SSp-bfd1", "name": "layer 1", "children": []},
        {"id": 201, "acronym": "SSp-bfd2/3", "name": "layer 2/3", "children": []},
        {"id": 1047, "acronym": "SSp-bfd4", "name": "layer 4", "children": []},
        {"id": 1070, "acronym": "SSp-bfd5", "name": "layer 5", "children": []},
        {"id": 1038, "acronym": "SSp-bfd6a", "name": "layer 6a", "children": []},
        {"id": 1062, "acronym": "SSp-bfd6b", "name": "layer 6b", "children": []}
      ]
    }]
  }]
}"#;

/// Bottom to top along y: 6b, 6a, 5, 4, 2/3, 1
const COLUMN_LABELS: [f64; 6] = [1062.0, 1038.0, 1070.0, 1047.0, 201.0, 981.0];

/// Layers as the principal-axis datasets name them, bottom to top
const STACK: [&str; 5] = ["L6", "L5", "L4", "L23", "L1"];

fn config() -> AtlasConfig {
    let mut config = AtlasConfig::default();
    config.layers.stack = STACK.iter().map(|s| s.to_string()).collect();
    config
}

/// Column of 1 x 6 x 1 voxels, 100 µm each, with layer boundaries from
/// `thicknesses` (bottom to top) and the axis position at `position`
fn column_store(thicknesses: [f64; 5], position: f64) -> InMemoryAtlasStore {
    let hierarchy = RegionHierarchy::from_json(HIERARCHY_JSON).expect("Failed to parse hierarchy");
    let labels = Array3::from_shape_fn((1, 6, 1), |(_, y, _)| COLUMN_LABELS[y]);
    let labels = VoxelData::new(labels.into_dyn(), [100.0; 3], [0.0; 3]).expect("labels");
    let axis = Array3::from_elem((1, 6, 1), position);
    let axis = VoxelData::new(axis.into_dyn(), [100.0; 3], [0.0; 3]).expect("axis");

    let mut store = InMemoryAtlasStore::new(hierarchy, labels).with_dataset("[PH]y", axis);
    let mut bottom = 0.0;
    for (layer, thickness) in STACK.iter().zip(thicknesses) {
        let raw = Array4::from_shape_fn((1, 6, 1, 2), |(_, _, _, c)| {
            if c == 0 {
                bottom
            } else {
                bottom + thickness
            }
        });
        let data = VoxelData::new(raw.into_dyn(), [100.0; 3], [0.0; 3]).expect("boundary");
        store.insert_dataset(format!("[PH]{}", layer), data);
        bottom += thickness;
    }
    store
}

// ============================================================================
// Convention detection and masks
// ============================================================================

#[test]
fn test_blue_brain_column() {
    let atlas = Atlas::open(column_store([100.0; 5], 250.0), config()).expect("Failed to open atlas");

    let profile = atlas.convention().expect("convention");
    assert_eq!(profile.layer, LayerConvention::BlueBrainAtlas);
    assert_eq!(profile.region, RegionConvention::Verbatim);
    assert_eq!(atlas.density_convention(), DensityConvention::Unavailable);

    let engine = atlas.masks();
    // L6 covers both 6a and 6b
    let l6 = engine
        .get_mask(&SpatialQuery::new().region("SSp-bfd").layer("L6"))
        .expect("mask");
    assert!(l6.is_clean());
    assert_eq!(l6.value.indices(), vec![[0, 0, 0], [0, 1, 0]]);

    let l1 = engine.get_mask(&SpatialQuery::new().layer("L1")).expect("mask");
    assert_eq!(l1.value.indices(), vec![[0, 5, 0]]);
}

#[test]
fn test_disjoint_layer_union() {
    let atlas = Atlas::open(column_store([100.0; 5], 250.0), config()).expect("Failed to open atlas");
    let engine = atlas.masks();

    let union = engine
        .get_mask(&SpatialQuery::new().region("SSp-bfd").layers(["L4", "L5"]))
        .expect("mask")
        .value;
    let l4 = engine
        .get_mask(&SpatialQuery::new().region("SSp-bfd").layer("L4"))
        .expect("mask")
        .value;
    let l5 = engine
        .get_mask(&SpatialQuery::new().region("SSp-bfd").layer("L5"))
        .expect("mask")
        .value;
    assert_eq!(union, l4.or(&l5).expect("same shape"));
    assert_eq!(union.count(), 2);
}

#[test]
fn test_layer_outside_stack() {
    let atlas = Atlas::open(column_store([100.0; 5], 250.0), config()).expect("Failed to open atlas");
    let err = atlas.principal_axis().thickness("L2").unwrap_err();
    assert!(matches!(err, AtlasError::UnknownLayer(_)));
}

#[test]
fn test_height_window() {
    let atlas = Atlas::open(column_store([100.0; 5], 250.0), config()).expect("Failed to open atlas");
    // Axis position 250 is height 250 everywhere
    let inside = atlas
        .masks()
        .get_mask(&SpatialQuery::new().height(AxisConstraint::absolute(200.0, 300.0)))
        .expect("mask");
    assert_eq!(inside.value.count(), 6);
    let outside = atlas
        .masks()
        .get_mask(&SpatialQuery::new().height(AxisConstraint::absolute(0.0, 250.0)))
        .expect("mask");
    assert!(outside.value.is_empty());
}

// ============================================================================
// Principal-axis invariants
// ============================================================================

proptest! {
    #[test]
    fn height_plus_depth_is_total_thickness(
        thicknesses in prop::array::uniform5(1.0f64..500.0),
        position in -100.0f64..3000.0,
    ) {
        let atlas = Atlas::open(column_store(thicknesses, position), config()).expect("atlas");
        let axis = atlas.principal_axis();
        let height = &axis.height().expect("height").value;
        let depth = &axis.depth().expect("depth").value;
        let total = &axis.total_thickness().expect("total").value;

        for ((h, d), t) in height.iter().zip(depth.iter()).zip(total.iter()) {
            prop_assert!(h.is_finite() && d.is_finite());
            prop_assert!((h + d - t).abs() < 1e-6);
        }

        let expected: f64 = thicknesses.iter().sum();
        prop_assert!((total[[0, 0, 0]] - expected).abs() < 1e-6);
    }

    #[test]
    fn layer_thickness_matches_boundaries(thicknesses in prop::array::uniform5(1.0f64..500.0)) {
        let atlas = Atlas::open(column_store(thicknesses, 0.0), config()).expect("atlas");
        for (layer, expected) in STACK.iter().zip(thicknesses) {
            let thickness = atlas.principal_axis().thickness(layer).expect("thickness");
            prop_assert!(thickness.is_clean());
            prop_assert!((thickness.value[[0, 3, 0]] - expected).abs() < 1e-9);
        }
    }
}
