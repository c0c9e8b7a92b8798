// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Small in-memory atlases for tests.

Every fixture shares one grid of shape `(2, 6, 3)` with 10 µm voxels:

- `x = 0` is the hind-limb region, `x = 1` the upper-limb region
- `y = 0..6` runs through layers L6 (bottom) to L1 (top), 10 µm each
- `z = 2` lies outside the brain (label 0, undefined axis data)

Only the acronym spelling differs between fixtures.
*/

use ndarray::{Array3, Array4};
use neuroatlas_structures::{
    InMemoryAtlasStore, RegionHierarchy, RegionId, RegionNode, VoxelData, VoxelGeometry,
};

use crate::atlas::Atlas;
use crate::density::DensityConvention;

pub const SHAPE: (usize, usize, usize) = (2, 6, 3);
pub const VOXEL_SIZE: f64 = 10.0;
pub const LAYER_THICKNESS: f64 = 10.0;
pub const L1_DAC_DENSITY: f64 = 12_000.0;
pub const L23_TPC_DENSITY: f64 = 300.0;

const ROOT_ID: RegionId = 100;
const PARENT_ID: RegionId = 200;
const REGION_IDS: [RegionId; 2] = [300, 400];

pub fn geometry() -> VoxelGeometry {
    VoxelGeometry::new(SHAPE, [VOXEL_SIZE; 3], [0.0; 3]).expect("fixture geometry")
}

fn inside(z: usize) -> bool {
    z < SHAPE.2 - 1
}

/// Layer number (1 = top) of a y index
fn layer_of(y: usize) -> u32 {
    (SHAPE.1 - y) as u32
}

/// Two regions under a common parent, six layer children each
fn layered_hierarchy(
    parent: (&str, &str),
    regions: [&str; 2],
    layer_acronym: impl Fn(&str, u32) -> String,
) -> RegionHierarchy {
    let mut h = RegionHierarchy::new();
    h.add_region(RegionNode::new(ROOT_ID, "root", "root"), None)
        .expect("root");
    h.add_region(RegionNode::new(PARENT_ID, parent.0, parent.1), Some(ROOT_ID))
        .expect("parent");
    for (base, region) in REGION_IDS.iter().zip(regions) {
        h.add_region(RegionNode::new(*base, region, region), Some(PARENT_ID))
            .expect("region");
        for layer in 1..=6 {
            let acronym = layer_acronym(region, layer);
            h.add_region(RegionNode::new(base + layer, acronym.clone(), acronym), Some(*base))
                .expect("layer");
        }
    }
    h
}

fn scalar(values: impl Fn(usize, usize, usize) -> f64) -> VoxelData {
    let field = Array3::from_shape_fn(SHAPE, |(x, y, z)| values(x, y, z));
    VoxelData::from_scalar(field, geometry()).expect("fixture scalar")
}

fn constant_inside(value: f64) -> VoxelData {
    scalar(|_, _, z| if inside(z) { value } else { f64::NAN })
}

/// Labels plus the `[PH]` principal-axis datasets
fn store_from(hierarchy: RegionHierarchy) -> InMemoryAtlasStore {
    let labels = scalar(|x, y, z| {
        if inside(z) {
            (REGION_IDS[x] + layer_of(y)) as f64
        } else {
            0.0
        }
    });
    let position = scalar(|_, y, z| {
        if inside(z) {
            y as f64 * LAYER_THICKNESS + LAYER_THICKNESS / 2.0
        } else {
            f64::NAN
        }
    });

    let mut store = InMemoryAtlasStore::new(hierarchy, labels).with_dataset("[PH]y", position);
    for layer in 1..=6u32 {
        let bottom = (SHAPE.1 as u32 - layer) as f64 * LAYER_THICKNESS;
        let raw = Array4::from_shape_fn((SHAPE.0, SHAPE.1, SHAPE.2, 2), |(_, _, z, c)| {
            match (inside(z), c) {
                (false, _) => f64::NAN,
                (true, 0) => bottom,
                (true, _) => bottom + LAYER_THICKNESS,
            }
        });
        let data = VoxelData::new(raw.into_dyn(), [VOXEL_SIZE; 3], [0.0; 3]).expect("boundary");
        store.insert_dataset(format!("[PH]L{}", layer), data);
    }
    store
}

/// `SSp-ll;L1` style acronyms, ABI region names
pub fn full_layer_store() -> InMemoryAtlasStore {
    store_from(layered_hierarchy(
        ("SS", "Somatosensory areas"),
        ["SSp-ll", "SSp-ul"],
        |region, layer| format!("{};L{}", region, layer),
    ))
}

/// `SSp-ll;1` style acronyms
pub fn semicolon_int_store() -> InMemoryAtlasStore {
    store_from(layered_hierarchy(
        ("SS", "Somatosensory areas"),
        ["SSp-ll", "SSp-ul"],
        |region, layer| format!("{};{}", region, layer),
    ))
}

/// `SSp-ll1` ... `SSp-ll6a` acronyms, with empty `6b` siblings
pub fn blue_brain_store() -> InMemoryAtlasStore {
    let mut hierarchy = layered_hierarchy(
        ("SS", "Somatosensory areas"),
        ["SSp-ll", "SSp-ul"],
        |region, layer| match layer {
            6 => format!("{}6a", region),
            n => format!("{}{}", region, n),
        },
    );
    for (base, region) in REGION_IDS.iter().zip(["SSp-ll", "SSp-ul"]) {
        let acronym = format!("{}6b", region);
        hierarchy
            .add_region(RegionNode::new(base + 7, acronym.clone(), acronym), Some(*base))
            .expect("6b");
    }
    store_from(hierarchy)
}

/// Rat atlas: `S1HL;L1` acronyms under `SSCtx`
pub fn paxinos_store() -> InMemoryAtlasStore {
    store_from(layered_hierarchy(
        ("SSCtx", "Somatosensory cortex"),
        ["S1HL", "S1FL"],
        |region, layer| format!("{};L{}", region, layer),
    ))
}

/// Mosaic-column atlas: `mc0_Column` and `mc1_Column` under `O1`
pub fn o1_store() -> InMemoryAtlasStore {
    store_from(layered_hierarchy(
        ("O1", "O1 mosaic"),
        ["mc0_Column", "mc1_Column"],
        |region, layer| {
            let column = region.trim_end_matches("_Column");
            format!("{};L{}", column, layer)
        },
    ))
}

/// Full-layer atlas with density files named after `convention`
pub fn density_store(convention: DensityConvention) -> InMemoryAtlasStore {
    let mut store = full_layer_store();
    let files: Vec<(&str, f64)> = match convention {
        DensityConvention::SclassBracketed => vec![
            ("[EXC]L23_TPC", L23_TPC_DENSITY),
            ("[INH]L1_DAC", L1_DAC_DENSITY),
            ("[cell_density]EXC", L23_TPC_DENSITY),
        ],
        DensityConvention::LayerPrefixed => vec![
            ("[cell_density]L2_TPC", 100.0),
            ("[cell_density]L3_TPC", 200.0),
            ("[cell_density]L1_DAC", L1_DAC_DENSITY),
            ("[cell_density]INH", L1_DAC_DENSITY),
        ],
        DensityConvention::Prefixless => vec![
            ("L23_TPC", L23_TPC_DENSITY),
            ("L1_DAC", L1_DAC_DENSITY),
            ("EXC", L23_TPC_DENSITY),
            ("INH", L1_DAC_DENSITY),
        ],
        DensityConvention::Unavailable => Vec::new(),
    };
    for (name, value) in files {
        store.insert_dataset(name, constant_inside(value));
    }
    store
}

fn open(store: InMemoryAtlasStore) -> Atlas<InMemoryAtlasStore> {
    Atlas::with_defaults(store).expect("fixture atlas")
}

pub fn full_layer_atlas() -> Atlas<InMemoryAtlasStore> {
    open(full_layer_store())
}

pub fn semicolon_int_atlas() -> Atlas<InMemoryAtlasStore> {
    open(semicolon_int_store())
}

pub fn blue_brain_atlas() -> Atlas<InMemoryAtlasStore> {
    open(blue_brain_store())
}

pub fn paxinos_atlas() -> Atlas<InMemoryAtlasStore> {
    open(paxinos_store())
}

pub fn o1_atlas() -> Atlas<InMemoryAtlasStore> {
    open(o1_store())
}

pub fn density_atlas(convention: DensityConvention) -> Atlas<InMemoryAtlasStore> {
    open(density_store(convention))
}
