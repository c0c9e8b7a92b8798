// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Convention detection by ordered predicates over the region hierarchy.

use neuroatlas_structures::{AtlasError, AtlasResult, RegionAttribute, RegionHierarchy};

use super::{ConventionProfile, LayerConvention, RegionConvention};

type Predicate = fn(&RegionHierarchy) -> AtlasResult<bool>;

fn has_acronym(hierarchy: &RegionHierarchy, value: &str) -> AtlasResult<bool> {
    Ok(!hierarchy
        .find(value, RegionAttribute::Acronym, false)?
        .is_empty())
}

fn is_full_layer(hierarchy: &RegionHierarchy) -> AtlasResult<bool> {
    Ok(has_acronym(hierarchy, "@^L1$")? || has_acronym(hierarchy, "@;L1$")?)
}

fn is_semicolon_int(hierarchy: &RegionHierarchy) -> AtlasResult<bool> {
    has_acronym(hierarchy, "@;6$")
}

fn is_blue_brain_atlas(hierarchy: &RegionHierarchy) -> AtlasResult<bool> {
    has_acronym(hierarchy, "@6a$")
}

fn is_paxinos_watson(hierarchy: &RegionHierarchy) -> AtlasResult<bool> {
    Ok(hierarchy.contains_acronym("SSCtx") || hierarchy.contains_acronym("S1HL"))
}

fn is_o1_columnar(hierarchy: &RegionHierarchy) -> AtlasResult<bool> {
    Ok(hierarchy.contains_acronym("O1") || hierarchy.contains_name("O1 mosaic"))
}

/// Layer families in priority order
const LAYER_DETECTORS: &[(LayerConvention, Predicate)] = &[
    (LayerConvention::FullLayer, is_full_layer),
    (LayerConvention::SemicolonInt, is_semicolon_int),
    (LayerConvention::BlueBrainAtlas, is_blue_brain_atlas),
];

/// Region families in priority order; `Verbatim` is the fallback
const REGION_DETECTORS: &[(RegionConvention, Predicate)] = &[
    (RegionConvention::PaxinosWatson, is_paxinos_watson),
    (RegionConvention::O1Columnar, is_o1_columnar),
];

/// First layer family whose predicate matches
pub fn detect_layer_convention(hierarchy: &RegionHierarchy) -> AtlasResult<LayerConvention> {
    for (convention, applies) in LAYER_DETECTORS {
        if applies(hierarchy)? {
            return Ok(*convention);
        }
    }
    Err(AtlasError::UnresolvedConvention(format!(
        "none of {:?} matched {} regions",
        LAYER_DETECTORS.iter().map(|(c, _)| c).collect::<Vec<_>>(),
        hierarchy.region_count()
    )))
}

/// First region family whose predicate matches
pub fn detect_region_convention(hierarchy: &RegionHierarchy) -> AtlasResult<RegionConvention> {
    for (convention, applies) in REGION_DETECTORS {
        if applies(hierarchy)? {
            return Ok(*convention);
        }
    }
    Ok(RegionConvention::Verbatim)
}

/// Detect the convention pair of an atlas hierarchy
///
/// # Errors
///
/// [`AtlasError::UnresolvedConvention`] when no layer family applies.
pub fn detect(hierarchy: &RegionHierarchy) -> AtlasResult<ConventionProfile> {
    let layer = detect_layer_convention(hierarchy)?;
    let region = detect_region_convention(hierarchy)?;
    let profile = ConventionProfile::new(layer, region);
    tracing::debug!("Detected atlas convention {}", profile);
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuroatlas_structures::RegionNode;

    fn hierarchy(acronyms: &[&str]) -> RegionHierarchy {
        let mut h = RegionHierarchy::new();
        h.add_region(RegionNode::new(1, "root", "root"), None).unwrap();
        for (i, acronym) in acronyms.iter().enumerate() {
            h.add_region(RegionNode::new(i as u32 + 2, *acronym, *acronym), Some(1))
                .unwrap();
        }
        h
    }

    #[test]
    fn test_full_layer() {
        let p = detect(&hierarchy(&["SSp-ll", "SSp-ll;L1", "SSp-ll;L6"])).unwrap();
        assert_eq!(p, ConventionProfile::new(LayerConvention::FullLayer, RegionConvention::Verbatim));

        let p = detect(&hierarchy(&["L1", "L2"])).unwrap();
        assert_eq!(p.layer, LayerConvention::FullLayer);
    }

    #[test]
    fn test_semicolon_int() {
        let p = detect(&hierarchy(&["SSp-ll", "SSp-ll;1", "SSp-ll;6"])).unwrap();
        assert_eq!(p.layer, LayerConvention::SemicolonInt);
    }

    #[test]
    fn test_blue_brain_atlas() {
        let p = detect(&hierarchy(&["SSp-ll", "SSp-ll1", "SSp-ll6a", "SSp-ll6b"])).unwrap();
        assert_eq!(p.layer, LayerConvention::BlueBrainAtlas);
    }

    #[test]
    fn test_priority_first_match_wins() {
        // Both FullLayer and BlueBrainAtlas acronyms present
        let p = detect(&hierarchy(&["L1", "SSp-ll6a", "X;6"])).unwrap();
        assert_eq!(p.layer, LayerConvention::FullLayer);

        let p = detect(&hierarchy(&["SSp-ll6a", "X;6"])).unwrap();
        assert_eq!(p.layer, LayerConvention::SemicolonInt);
    }

    #[test]
    fn test_region_families() {
        let p = detect(&hierarchy(&["S1HL", "S1HL;L1"])).unwrap();
        assert_eq!(p.region, RegionConvention::PaxinosWatson);

        let p = detect(&hierarchy(&["SSCtx", "O1", "L1"])).unwrap();
        assert_eq!(p.region, RegionConvention::PaxinosWatson);

        let p = detect(&hierarchy(&["O1", "mc2_Column", "L1"])).unwrap();
        assert_eq!(p.region, RegionConvention::O1Columnar);
        assert!(p.supports_columns());
    }

    #[test]
    fn test_o1_by_name() {
        let mut h = hierarchy(&["L1"]);
        h.add_region(RegionNode::new(50, "mosaic", "O1 mosaic"), Some(1))
            .unwrap();
        assert_eq!(detect(&h).unwrap().region, RegionConvention::O1Columnar);
    }

    #[test]
    fn test_unresolved() {
        let err = detect(&hierarchy(&["Isocortex", "SSp-ll"])).unwrap_err();
        assert!(matches!(err, AtlasError::UnresolvedConvention(_)));
    }
}
