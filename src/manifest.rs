//! The manifest is the JSON form of a template tree exchanged with out-of-process builders.
//!
//! A builder that runs a template against a binary file can dump what it found as nested JSON;
//! loading it goes through the same constructors and `add_range` calls an in-process builder
//! would make, so every tree invariant is enforced on the way in.

use crate::error::{ManifestError, TreeError};
use crate::node::NodeId;
use crate::tree::TemplateTree;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
/// Serialisable description of one node and its subtree.
pub struct NodeManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Field or group name.
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Decoded value text, only allowed on leaves.
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    /// Whether the node is a pure container.
    pub group: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    /// Whether the node renders as a section break; implies `group`.
    pub section: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    /// Byte intervals claimed by the node, in the order the builder reported them.
    pub ranges: Vec<RangeEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    /// Nested nodes in template order.
    pub children: Vec<NodeManifest>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
/// Raw interval as written in a manifest, validated when loaded into a tree.
pub struct RangeEntry {
    /// First byte covered.
    pub location: u64,
    /// Number of bytes covered; zero-length entries are dropped on load.
    pub length: u64,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Parse manifest text holding either an array of top-level nodes or a single node object.
///
/// # Errors
///
/// Returns [`ManifestError::Json`] if the text matches neither shape.
pub fn parse_manifest_json(json_str: &str) -> Result<Vec<NodeManifest>, ManifestError> {
    if json_str.trim_start().starts_with('[') {
        Ok(serde_json::from_str::<Vec<NodeManifest>>(json_str)?)
    } else {
        Ok(vec![serde_json::from_str::<NodeManifest>(json_str)?])
    }
}

/// Deepest nesting a manifest may describe, counting a top-level node as depth zero.
///
/// A node at depth `d` sits inside `2d + 4` JSON containers once its ranges are written out,
/// which keeps every manifest inside `serde_json`'s default nesting limit of 128. Import and
/// export both reject deeper trees with [`ManifestError::TooDeep`].
pub const MAX_MANIFEST_DEPTH: usize = 60;

/// Deepest nesting level below `manifest`, walked with an explicit stack.
fn manifest_depth(manifest: &NodeManifest) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(manifest, 0)];
    while let Some((current, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        stack.extend(current.children.iter().map(|child| (child, depth + 1)));
    }
    deepest
}

impl TemplateTree {
    /// Build a tree from top-level manifests.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::TooDeep`] for manifests nested past [`MAX_MANIFEST_DEPTH`] and
    /// [`ManifestError::Tree`] for the first entry that breaks a tree invariant.
    pub fn from_manifests(manifests: &[NodeManifest]) -> Result<Self, ManifestError> {
        let mut tree = Self::new();
        for manifest in manifests {
            tree.load_manifest(manifest, None)?;
        }
        Ok(tree)
    }

    /// Append the subtree described by `manifest` under `parent`, returning the new node's id.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::TooDeep`] before creating anything when the manifest nests past
    /// [`MAX_MANIFEST_DEPTH`]. Otherwise returns the first [`TreeError`] raised while
    /// constructing the subtree; nodes created before that failure stay in the tree.
    pub fn load_manifest(
        &mut self,
        manifest: &NodeManifest,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ManifestError> {
        let depth = manifest_depth(manifest);
        if depth > MAX_MANIFEST_DEPTH {
            return Err(ManifestError::TooDeep {
                depth,
                max: MAX_MANIFEST_DEPTH,
            });
        }

        let top = self.load_node(manifest, parent)?;
        let mut stack: Vec<(&NodeManifest, NodeId)> = manifest
            .children
            .iter()
            .rev()
            .map(|child| (child, top))
            .collect();
        while let Some((current, parent_id)) = stack.pop() {
            let id = self.load_node(current, Some(parent_id))?;
            stack.extend(current.children.iter().rev().map(|child| (child, id)));
        }
        Ok(top)
    }

    /// Create one node from its manifest entry, without its children.
    fn load_node(
        &mut self,
        manifest: &NodeManifest,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        let label = manifest.label.clone();
        let id = if manifest.section {
            self.new_section(label, parent)?
        } else if manifest.group {
            self.new_group(label, parent)?
        } else {
            self.new_leaf(label, None, parent)?
        };
        if manifest.value.is_some() {
            self.set_value(id, manifest.value.clone())?;
        }
        for range in &manifest.ranges {
            self.add_range(id, range.location, range.length)?;
        }
        Ok(id)
    }

    /// Export every top-level subtree in document order.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::TooDeep`] when any subtree nests past [`MAX_MANIFEST_DEPTH`].
    pub fn to_manifests(&self) -> Result<Vec<NodeManifest>, ManifestError> {
        let mut manifests = Vec::with_capacity(self.roots().len());
        for &root in self.roots() {
            if let Some(manifest) = self.to_manifest(root)? {
                manifests.push(manifest);
            }
        }
        Ok(manifests)
    }

    /// Export the subtree rooted at `id`, or `None` if `id` is not live.
    ///
    /// Nodes are visited in reverse document order so every child is finished before its
    /// parent; finished children wait on a stack tagged with their depth.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::TooDeep`] when the subtree nests past [`MAX_MANIFEST_DEPTH`].
    pub fn to_manifest(&self, id: NodeId) -> Result<Option<NodeManifest>, ManifestError> {
        let order: Vec<(NodeId, usize)> = self.walk_from(id).collect();
        if let Some(depth) = order.iter().map(|&(_, depth)| depth).max() {
            if depth > MAX_MANIFEST_DEPTH {
                return Err(ManifestError::TooDeep {
                    depth,
                    max: MAX_MANIFEST_DEPTH,
                });
            }
        }

        let mut finished: Vec<(usize, NodeManifest)> = Vec::new();
        for &(current, depth) in order.iter().rev() {
            let Some(node) = self.get(current) else {
                continue;
            };
            let mut children = Vec::with_capacity(node.children().len());
            while finished.last().is_some_and(|(d, _)| *d == depth + 1) {
                if let Some((_, child)) = finished.pop() {
                    children.push(child);
                }
            }
            finished.push((
                depth,
                NodeManifest {
                    label: node.label().map(str::to_string),
                    value: node.value().map(str::to_string),
                    // section implies group
                    group: node.is_group() && !node.is_section(),
                    section: node.is_section(),
                    ranges: node
                        .ranges()
                        .iter()
                        .map(|r| RangeEntry {
                            location: r.location(),
                            length: r.length(),
                        })
                        .collect(),
                    children,
                },
            ));
        }
        Ok(finished.pop().map(|(_, manifest)| manifest))
    }
}

/// Parse manifest text straight into a tree.
///
/// # Errors
///
/// Returns [`ManifestError::Json`] for malformed text (including JSON nested past
/// `serde_json`'s limit), [`ManifestError::TooDeep`] for trees deeper than
/// [`MAX_MANIFEST_DEPTH`] and [`ManifestError::Tree`] when the described tree breaks an
/// invariant.
pub fn load_tree_json(json_str: &str) -> Result<TemplateTree, ManifestError> {
    let manifests = parse_manifest_json(json_str)?;
    TemplateTree::from_manifests(&manifests)
}

#[cfg(test)]
#[path = "tests/manifest.rs"]
mod tests;
