// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Structured warning channel.
//!
//! Soft failures (an acronym absent from this atlas, a missing dataset, a
//! column query against a whole-brain atlas) never abort a query. The value is
//! replaced by a sentinel and an [`AtlasWarning`] travels next to it inside a
//! [`Diagnosed`], so batch callers can log and continue or escalate.

use serde::Serialize;
use std::fmt::{Display, Formatter};

/// A non-fatal condition encountered while answering a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AtlasWarning {
    /// Region acronym has no match in the hierarchy
    UnknownRegion { region: String },
    /// Layer pattern has no match in the hierarchy
    UnknownLayer { layer: String, pattern: String },
    /// Region and layer both exist but no region id lies in both
    DisjointRegionLayer {
        regions: Vec<String>,
        layers: Vec<String>,
    },
    /// Column name has no `_Column` node in a columnar atlas
    UnknownColumn { column: String },
    /// Column constraint on an atlas without columns; the constraint is dropped
    ColumnsUnsupported { columns: Vec<String> },
    /// Dataset could not be loaded or had the wrong shape
    MissingDataset { dataset: String, reason: String },
    /// Boundary data with top below bottom was replaced by NaN
    InvertedInterval { layer: String, voxels: usize },
    /// No density dataset matched the cell filter
    UnresolvedDensity { filter: String },
}

impl Display for AtlasWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AtlasWarning::UnknownRegion { region } => {
                write!(f, "region {} not found in atlas hierarchy", region)
            }
            AtlasWarning::UnknownLayer { layer, pattern } => write!(
                f,
                "layer {} (pattern {}) not found in atlas hierarchy",
                layer, pattern
            ),
            AtlasWarning::DisjointRegionLayer { regions, layers } => write!(
                f,
                "regions {:?} contain none of layers {:?}",
                regions, layers
            ),
            AtlasWarning::UnknownColumn { column } => {
                write!(f, "column {} not found in columnar atlas", column)
            }
            AtlasWarning::ColumnsUnsupported { columns } => write!(
                f,
                "atlas has no columns, ignoring column constraint {:?}",
                columns
            ),
            AtlasWarning::MissingDataset { dataset, reason } => {
                write!(f, "dataset {} unavailable: {}", dataset, reason)
            }
            AtlasWarning::InvertedInterval { layer, voxels } => write!(
                f,
                "layer {} has {} voxels with top below bottom, treated as undefined",
                layer, voxels
            ),
            AtlasWarning::UnresolvedDensity { filter } => {
                write!(f, "no density dataset for {}", filter)
            }
        }
    }
}

/// A value together with the warnings produced while computing it
#[must_use]
#[derive(Debug, Clone)]
pub struct Diagnosed<T> {
    pub value: T,
    pub warnings: Vec<AtlasWarning>,
}

impl<T> Diagnosed<T> {
    /// Wrap a value computed without incident
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Wrap a value with one warning, logging it
    pub fn warned(value: T, warning: AtlasWarning) -> Self {
        let mut diagnosed = Self::clean(value);
        diagnosed.warn(warning);
        diagnosed
    }

    /// Record a new warning. Every warning is logged exactly once, here.
    pub fn warn(&mut self, warning: AtlasWarning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Carry over warnings that were already logged elsewhere
    pub fn absorb(&mut self, warnings: &[AtlasWarning]) {
        self.warnings.extend_from_slice(warnings);
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Diagnosed<U> {
        Diagnosed {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    pub fn into_parts(self) -> (T, Vec<AtlasWarning>) {
        (self.value, self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warned_records_warning() {
        let d = Diagnosed::warned(
            0usize,
            AtlasWarning::UnknownRegion {
                region: "XYZ".to_string(),
            },
        );
        assert!(!d.is_clean());
        assert_eq!(d.warnings.len(), 1);
        assert!(d.warnings[0].to_string().contains("XYZ"));
    }

    #[test]
    fn test_map_keeps_warnings() {
        let mut d = Diagnosed::clean(2);
        d.absorb(&[AtlasWarning::UnresolvedDensity {
            filter: "mtype=L1_DAC".to_string(),
        }]);
        let (value, warnings) = d.map(|v| v * 3).into_parts();
        assert_eq!(value, 6);
        assert_eq!(warnings.len(), 1);
    }
}
