// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Query value types.

A [`SpatialQuery`] is a conjunction of optional fields; each populated field
is a disjunction over its values. `SpatialQuery::default()` selects every
valid voxel.
*/

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Half-open intervals `[bottom, top)` along the principal axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisConstraint {
    pub intervals: Vec<(f64, f64)>,
    /// Compare against the field normalised by total thickness
    #[serde(default)]
    pub relative: bool,
}

impl AxisConstraint {
    pub fn absolute(bottom: f64, top: f64) -> Self {
        Self {
            intervals: vec![(bottom, top)],
            relative: false,
        }
    }

    pub fn relative(bottom: f64, top: f64) -> Self {
        Self {
            intervals: vec![(bottom, top)],
            relative: true,
        }
    }

    /// NaN satisfies no interval
    pub fn contains(&self, value: f64) -> bool {
        self.intervals
            .iter()
            .any(|&(bottom, top)| bottom <= value && value < top)
    }
}

/// Logical spatial query over an atlas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialQuery {
    pub region: Option<Vec<String>>,
    pub layer: Option<Vec<String>>,
    pub column: Option<Vec<String>>,
    pub depth: Option<AxisConstraint>,
    pub height: Option<AxisConstraint>,
}

impl SpatialQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn region(self, region: impl Into<String>) -> Self {
        self.regions([region])
    }

    pub fn regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.region = Some(regions.into_iter().map(Into::into).collect());
        self
    }

    pub fn layer(self, layer: impl Into<String>) -> Self {
        self.layers([layer])
    }

    pub fn layers<I, S>(mut self, layers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layer = Some(layers.into_iter().map(Into::into).collect());
        self
    }

    pub fn column(self, column: impl Into<String>) -> Self {
        self.columns([column])
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.column = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn depth(mut self, constraint: AxisConstraint) -> Self {
        self.depth = Some(constraint);
        self
    }

    pub fn height(mut self, constraint: AxisConstraint) -> Self {
        self.height = Some(constraint);
        self
    }

    /// True when no field is populated
    pub fn is_unconstrained(&self) -> bool {
        self == &Self::default()
    }
}

/// Excitatory or inhibitory synapse class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SynapseClass {
    #[serde(rename = "EXC")]
    Excitatory,
    #[serde(rename = "INH")]
    Inhibitory,
}

impl SynapseClass {
    pub const ALL: [SynapseClass; 2] = [SynapseClass::Excitatory, SynapseClass::Inhibitory];

    /// Label used in dataset names
    pub fn label(&self) -> &'static str {
        match self {
            SynapseClass::Excitatory => "EXC",
            SynapseClass::Inhibitory => "INH",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "EXC" => Some(SynapseClass::Excitatory),
            "INH" => Some(SynapseClass::Inhibitory),
            _ => None,
        }
    }
}

impl Display for SynapseClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Cell filter for density lookups
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellQuery {
    pub mtype: Option<String>,
    pub synapse_class: Option<SynapseClass>,
}

impl CellQuery {
    pub fn mtype(mtype: impl Into<String>) -> Self {
        Self {
            mtype: Some(mtype.into()),
            synapse_class: None,
        }
    }

    pub fn synapse_class(class: SynapseClass) -> Self {
        Self {
            mtype: None,
            synapse_class: Some(class),
        }
    }
}

impl Display for CellQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match (&self.mtype, &self.synapse_class) {
            (Some(mtype), Some(class)) => write!(f, "mtype={} sclass={}", mtype, class),
            (Some(mtype), None) => write!(f, "mtype={}", mtype),
            (None, Some(class)) => write!(f, "sclass={}", class),
            (None, None) => f.write_str("all cells"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let q = SpatialQuery::new()
            .regions(["SSp-ll", "SSp-ul"])
            .layer("L1")
            .depth(AxisConstraint::absolute(0.0, 100.0));
        assert_eq!(q.region.as_ref().map(Vec::len), Some(2));
        assert_eq!(q.layer, Some(vec!["L1".to_string()]));
        assert!(q.height.is_none());
        assert!(!q.is_unconstrained());
        assert!(SpatialQuery::new().is_unconstrained());
    }

    #[test]
    fn test_axis_constraint_half_open() {
        let c = AxisConstraint {
            intervals: vec![(0.0, 10.0), (20.0, 30.0)],
            relative: false,
        };
        assert!(c.contains(0.0));
        assert!(!c.contains(10.0));
        assert!(c.contains(25.0));
        assert!(!c.contains(f64::NAN));
    }

    #[test]
    fn test_query_deserializes_with_defaults() {
        let q: SpatialQuery = serde_json::from_str(
            r#"{"layer": ["L2", "L3"], "height": {"intervals": [[0.0, 0.5]], "relative": true}}"#,
        )
        .unwrap();
        assert_eq!(q.layer.unwrap().len(), 2);
        assert!(q.height.unwrap().relative);

        let c: CellQuery = serde_json::from_str(r#"{"synapse_class": "INH"}"#).unwrap();
        assert_eq!(c.synapse_class, Some(SynapseClass::Inhibitory));
        assert_eq!(c.to_string(), "sclass=INH");
    }
}
