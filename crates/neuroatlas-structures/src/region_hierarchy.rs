// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
RegionHierarchy - Tree structure of atlas regions.

Maps region ids to acronyms and names and resolves acronyms or acronym
patterns to descendant-inclusive id sets.

# Lookup wire format

A lookup value starting with `@` is a regular expression, matched with
*search* semantics (anywhere in the attribute). Any other value must match the
attribute exactly. The same convention is used by
[`AtlasStore::get_region_mask`](crate::AtlasStore::get_region_mask).
*/

use ahash::{AHashMap, AHashSet};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, AtlasResult};

/// Integer label stored in the `brain_regions` dataset. `0` is outside the brain.
pub type RegionId = u32;

/// One node of the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionNode {
    pub id: RegionId,
    pub acronym: String,
    pub name: String,
}

impl RegionNode {
    pub fn new(id: RegionId, acronym: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            acronym: acronym.into(),
            name: name.into(),
        }
    }
}

/// Which node attribute a lookup value is compared against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionAttribute {
    Acronym,
    Name,
}

/// Nested JSON layout (`{id, acronym, name, children: [...]}`)
#[derive(Debug, Deserialize)]
struct JsonRegion {
    id: RegionId,
    acronym: String,
    name: String,
    #[serde(default)]
    children: Vec<JsonRegion>,
}

/// Some providers wrap the root node as `{"msg": [root]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonHierarchy {
    Wrapped { msg: Vec<JsonRegion> },
    Root(JsonRegion),
}

/// Hierarchical tree of atlas regions
///
/// Read-only once built: the atlas storage layer assembles it with
/// [`add_region`](Self::add_region) or [`from_json`](Self::from_json), the
/// engine only queries it.
#[derive(Debug, Clone, Default)]
pub struct RegionHierarchy {
    /// Map of region_id -> node
    regions: AHashMap<RegionId, RegionNode>,

    /// Map of region_id -> parent_region_id
    parent_map: AHashMap<RegionId, RegionId>,

    /// Map of region_id -> child_region_ids
    children_map: AHashMap<RegionId, Vec<RegionId>>,

    /// Regions without a parent, in insertion order
    roots: Vec<RegionId>,
}

impl RegionHierarchy {
    /// Create a new empty hierarchy
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region to the hierarchy
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Region ID already exists
    /// - Region ID is 0 (reserved for voxels outside the brain)
    /// - Parent ID doesn't exist
    ///
    pub fn add_region(&mut self, region: RegionNode, parent_id: Option<RegionId>) -> AtlasResult<()> {
        let region_id = region.id;

        if region_id == 0 {
            return Err(AtlasError::InvalidData(format!(
                "Region {} uses reserved id 0",
                region.acronym
            )));
        }

        if self.regions.contains_key(&region_id) {
            return Err(AtlasError::InvalidData(format!(
                "Region {} already exists",
                region_id
            )));
        }

        if let Some(parent) = parent_id {
            if !self.regions.contains_key(&parent) {
                return Err(AtlasError::InvalidData(format!(
                    "Parent region {} does not exist",
                    parent
                )));
            }
        }

        self.regions.insert(region_id, region);

        match parent_id {
            Some(parent) => {
                self.parent_map.insert(region_id, parent);
                self.children_map.entry(parent).or_default().push(region_id);
            }
            None => self.roots.push(region_id),
        }

        Ok(())
    }

    /// Parse a nested hierarchy JSON document
    pub fn from_json(json: &str) -> AtlasResult<Self> {
        let parsed: JsonHierarchy = serde_json::from_str(json)?;
        let roots = match parsed {
            JsonHierarchy::Wrapped { msg } => msg,
            JsonHierarchy::Root(root) => vec![root],
        };

        let mut hierarchy = Self::new();
        let mut to_visit: Vec<(JsonRegion, Option<RegionId>)> =
            roots.into_iter().rev().map(|r| (r, None)).collect();

        while let Some((node, parent)) = to_visit.pop() {
            let id = node.id;
            hierarchy.add_region(RegionNode::new(id, node.acronym, node.name), parent)?;
            to_visit.extend(node.children.into_iter().rev().map(|c| (c, Some(id))));
        }

        Ok(hierarchy)
    }

    /// Get a region by ID
    pub fn get_region(&self, region_id: RegionId) -> Option<&RegionNode> {
        self.regions.get(&region_id)
    }

    /// Get the parent of a region
    pub fn get_parent(&self, region_id: RegionId) -> Option<RegionId> {
        self.parent_map.get(&region_id).copied()
    }

    /// Get all children of a region
    pub fn get_children(&self, region_id: RegionId) -> &[RegionId] {
        self.children_map
            .get(&region_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Get all descendant regions (recursive, excluding the region itself)
    pub fn get_all_descendants(&self, region_id: RegionId) -> Vec<RegionId> {
        let mut descendants = Vec::new();
        let mut to_visit = vec![region_id];

        while let Some(current) = to_visit.pop() {
            for &child in self.get_children(current) {
                descendants.push(child);
                to_visit.push(child);
            }
        }

        descendants
    }

    /// Ancestors from the direct parent up to the root
    pub fn get_ancestors(&self, region_id: RegionId) -> Vec<RegionId> {
        let mut ancestors = Vec::new();
        let mut current = region_id;

        while let Some(parent) = self.parent_map.get(&current) {
            ancestors.push(*parent);
            current = *parent;
        }

        ancestors
    }

    /// Check if one region is a descendant of another
    pub fn is_descendant(&self, potential_descendant: RegionId, ancestor: RegionId) -> bool {
        self.get_ancestors(potential_descendant).contains(&ancestor)
    }

    /// Resolve a lookup value to region ids
    ///
    /// `value` is an exact attribute value or an `@`-prefixed regex. An
    /// unmatched value yields an empty set, never an error; only a malformed
    /// regex fails.
    pub fn find(
        &self,
        value: &str,
        attribute: RegionAttribute,
        with_descendants: bool,
    ) -> AtlasResult<AHashSet<RegionId>> {
        fn attr(attribute: RegionAttribute, node: &RegionNode) -> &str {
            match attribute {
                RegionAttribute::Acronym => &node.acronym,
                RegionAttribute::Name => &node.name,
            }
        }

        let mut found: AHashSet<RegionId> = match value.strip_prefix('@') {
            Some(pattern) => {
                let regex = Regex::new(pattern)?;
                self.regions
                    .values()
                    .filter(|node| regex.is_match(attr(attribute, node)))
                    .map(|node| node.id)
                    .collect()
            }
            None => self
                .regions
                .values()
                .filter(|node| attr(attribute, node) == value)
                .map(|node| node.id)
                .collect(),
        };

        if with_descendants {
            let direct: Vec<RegionId> = found.iter().copied().collect();
            for id in direct {
                found.extend(self.get_all_descendants(id));
            }
        }

        Ok(found)
    }

    /// Descendant-inclusive acronym lookup, the common case
    pub fn find_acronym(&self, value: &str) -> AtlasResult<AHashSet<RegionId>> {
        self.find(value, RegionAttribute::Acronym, true)
    }

    /// Exact acronym membership
    pub fn contains_acronym(&self, acronym: &str) -> bool {
        self.regions.values().any(|node| node.acronym == acronym)
    }

    /// Exact name membership
    pub fn contains_name(&self, name: &str) -> bool {
        self.regions.values().any(|node| node.name == name)
    }

    /// Iterate over every acronym (unordered)
    pub fn acronyms(&self) -> impl Iterator<Item = &str> {
        self.regions.values().map(|node| node.acronym.as_str())
    }

    /// Get all region IDs
    pub fn get_all_region_ids(&self) -> AHashSet<RegionId> {
        self.regions.keys().copied().collect()
    }

    /// Regions without a parent
    pub fn get_root_ids(&self) -> &[RegionId] {
        &self.roots
    }

    /// Get the total number of regions
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
