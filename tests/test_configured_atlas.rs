// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Opening atlases through the facade with file-based configuration

use neuroatlas::prelude::*;
use neuroatlas::spatial::fixtures;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp config");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp config");
    file
}

#[test]
fn test_truncated_layer_stack_moves_global_top() {
    let config = write_config(
        r#"
[layers]
stack = ["L6", "L5", "L4"]

[sampling]
seed = 42
"#,
    );
    let atlas = neuroatlas::open_atlas(fixtures::full_layer_store(), Some(config.path()))
        .expect("Failed to open atlas");
    assert_eq!(atlas.config().sampling.seed, Some(42));

    let axis = atlas.principal_axis();
    // Top of L4 is 30 µm above the bottom of L6; the L4 voxel row sits at 25
    assert_eq!(axis.global_top().expect("top").value[[0, 2, 0]], 30.0);
    assert_eq!(axis.depth().expect("depth").value[[0, 2, 0]], 5.0);
    assert!(matches!(
        axis.thickness("L1"),
        Err(AtlasError::UnknownLayer(_))
    ));
}

#[test]
fn test_seeded_sampling_is_reproducible() {
    let config = write_config("[sampling]\nseed = 7\n");
    let atlas = neuroatlas::open_atlas(fixtures::full_layer_store(), Some(config.path()))
        .expect("Failed to open atlas");
    let query = SpatialQuery::new().region("SSp-ul");

    let first = neuroatlas::spatial::sample(&atlas, &query, 25).expect("sample");
    let second = neuroatlas::spatial::sample(&atlas, &query, 25).expect("sample");
    assert_eq!(first, second);
}

#[test]
fn test_invalid_config_file_is_config_error() {
    let config = write_config("[principal_axis]\nboundary_template = \"[PH]\"\n");
    let err = neuroatlas::open_atlas(fixtures::full_layer_store(), Some(config.path())).unwrap_err();
    assert!(matches!(err, AtlasError::Config(_)));

    let config = write_config("[layers\nstack = 3");
    let err = neuroatlas::open_atlas(fixtures::full_layer_store(), Some(config.path())).unwrap_err();
    assert!(matches!(err, AtlasError::Config(_)));
}

#[test]
fn test_density_through_facade() {
    let config = write_config("[density]\nexcitatory_morphologies = [\"TPC\"]\n");
    let atlas = neuroatlas::open_atlas(
        fixtures::density_store(DensityConvention::Prefixless),
        Some(config.path()),
    )
    .expect("Failed to open atlas");

    let densities = atlas.densities();
    let exc = densities
        .density(&CellQuery::synapse_class(SynapseClass::Excitatory))
        .expect("density");
    assert!(exc.is_clean());
    assert_eq!(exc.value[[1, 0, 0]], fixtures::L23_TPC_DENSITY);

    let total = densities.density(&CellQuery::default()).expect("density");
    assert_eq!(
        total.value[[1, 0, 0]],
        fixtures::L23_TPC_DENSITY + fixtures::L1_DAC_DENSITY
    );
    assert!(total.value[[1, 0, 2]].is_nan());
}

#[cfg(feature = "observability")]
#[test]
fn test_debug_flags_cover_engine_crate() {
    let flags = CrateDebugFlags::from_args(vec!["--debug-all".to_string()]);
    assert!(flags.is_enabled("neuroatlas-spatial"));
    assert!(flags
        .to_filter_string("warn")
        .contains("neuroatlas_spatial=debug"));
}
