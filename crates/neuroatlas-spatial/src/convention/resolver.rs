// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logical region/layer names to atlas-native acronyms and region ids.

use ahash::AHashSet;
use neuroatlas_structures::{AtlasResult, RegionHierarchy, RegionId};

use super::{ConventionProfile, LayerConvention, RegionConvention};

/// ABI to Paxinos-Watson rewrites, applied in order.
///
/// Longer codes sharing a prefix with a shorter one come first, otherwise
/// `-ulp`, `-dzo` and `SSs` could never be reached.
const PAXINOS_REPLACEMENTS: &[(&str, &str)] = &[
    ("SSp", "S1"),
    ("SSs", "S2"),
    ("-bfd", "BF"),
    ("-ulp", "ULp"),
    ("-ul", "FL"),
    ("-ll", "HL"),
    ("-m", "J"),
    ("-tr", "Tr"),
    ("-dzo", "DZO"),
    ("-dz", "DZ"),
    ("-sh", "Sh"),
    ("SS", "SSCtx"),
];

const COLUMN_SUFFIX: &str = "_Column";

fn paxinos_acronym(region: &str) -> String {
    PAXINOS_REPLACEMENTS
        .iter()
        .fold(region.to_string(), |acronym, (from, to)| acronym.replace(from, to))
}

/// Atlas-native acronym of a logical region, `None` if the atlas lacks it
pub fn region_acronym(
    profile: &ConventionProfile,
    hierarchy: &RegionHierarchy,
    region: &str,
) -> Option<String> {
    match profile.region {
        RegionConvention::Verbatim => Some(region.to_string()),
        RegionConvention::PaxinosWatson => Some(paxinos_acronym(region)),
        RegionConvention::O1Columnar => {
            let column = format!("{}{}", region, COLUMN_SUFFIX);
            hierarchy.contains_acronym(&column).then_some(column)
        }
    }
}

fn is_cortical_layer(layer: &str) -> bool {
    layer
        .strip_prefix('L')
        .map_or(false, |rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

/// `@`-pattern matching every acronym of `layer` in this atlas
pub fn layer_query_pattern(profile: &ConventionProfile, layer: &str) -> String {
    match profile.layer {
        LayerConvention::FullLayer => format!("@{}$", layer),
        LayerConvention::SemicolonInt => {
            let digit = layer.chars().last().map(String::from).unwrap_or_default();
            format!("@;{}$", digit)
        }
        LayerConvention::BlueBrainAtlas => {
            let suffix = if is_cortical_layer(layer) {
                layer[1..].to_string()
            } else {
                layer.to_lowercase()
            };
            format!("@.*{}[ab]?$", suffix)
        }
    }
}

/// Descendant-inclusive region ids for a region and/or layer
///
/// Both given: the intersection. Neither: every id. An acronym absent from the
/// atlas contributes an empty set; callers report that as "no voxels".
///
/// # Errors
///
/// Only a malformed pattern fails ([`AtlasError::InvalidPattern`](neuroatlas_structures::AtlasError)).
pub fn resolve_ids(
    profile: &ConventionProfile,
    hierarchy: &RegionHierarchy,
    region: Option<&str>,
    layer: Option<&str>,
) -> AtlasResult<AHashSet<RegionId>> {
    let region_ids = match region {
        Some(region) => Some(match region_acronym(profile, hierarchy, region) {
            Some(acronym) => hierarchy.find_acronym(&acronym)?,
            None => AHashSet::new(),
        }),
        None => None,
    };
    let layer_ids = match layer {
        Some(layer) => Some(hierarchy.find_acronym(&layer_query_pattern(profile, layer))?),
        None => None,
    };

    let ids = match (region_ids, layer_ids) {
        (Some(r), Some(l)) => r.intersection(&l).copied().collect(),
        (Some(r), None) => r,
        (None, Some(l)) => l,
        (None, None) => hierarchy.get_all_region_ids(),
    };
    tracing::debug!(
        "Resolved region={:?} layer={:?} to {} ids",
        region,
        layer,
        ids.len()
    );
    Ok(ids)
}
