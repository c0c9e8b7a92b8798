// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Atlas naming conventions.

Data providers disagree on how layers and regions are spelled in the region
hierarchy. A [`ConventionProfile`] pins one layer family and one region family
for an atlas; [`detector`] picks it, [`resolver`] uses it to turn logical
names into the `@`-pattern wire format.

| Layer family | Example acronyms |
|---|---|
| `FullLayer` | `L1`, `SSp-ll;L1` |
| `SemicolonInt` | `SSp-ll;1`, `SSp-ll;6` |
| `BlueBrainAtlas` | `SSp-ll1`, `SSp-ll6a`, `SSp-ll6b` |

| Region family | Meaning |
|---|---|
| `Verbatim` | ABI acronyms used as-is |
| `PaxinosWatson` | rat atlas, ABI codes rewritten (`SSp-ll` → `S1HL`) |
| `O1Columnar` | mosaic-column atlas, regions are `<name>_Column` nodes |
*/

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub mod detector;
pub mod resolver;

pub use detector::detect;
pub use resolver::{layer_query_pattern, region_acronym, resolve_ids};

/// How layer acronyms are spelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerConvention {
    FullLayer,
    SemicolonInt,
    BlueBrainAtlas,
}

/// How region acronyms are spelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegionConvention {
    Verbatim,
    PaxinosWatson,
    O1Columnar,
}

/// The resolved convention pair of one atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConventionProfile {
    pub layer: LayerConvention,
    pub region: RegionConvention,
}

impl ConventionProfile {
    pub fn new(layer: LayerConvention, region: RegionConvention) -> Self {
        Self { layer, region }
    }

    /// Only mosaic-column atlases can answer column constraints
    pub fn supports_columns(&self) -> bool {
        self.region == RegionConvention::O1Columnar
    }
}

impl Display for ConventionProfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}/{:?}", self.layer, self.region)
    }
}
