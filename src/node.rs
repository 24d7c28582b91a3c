//! Template node representation for annotated binary blobs.
//!
//! A node labels one semantic field (or a grouping of fields) laid over the raw bytes shown in a
//! hex viewer. Nodes live in a [`TemplateTree`](crate::tree::TemplateTree) arena and refer to
//! each other by [`NodeId`]: the parent lists its children, and each child keeps a plain id back
//! to its parent that never extends the parent's lifetime.

use crate::error::TreeError;
use crate::range::{self, ByteRange};
use log::debug;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Stable handle to a node slot in a tree.
///
/// The generation changes whenever a slot is reclaimed, so an id kept after its node was removed
/// resolves to nothing rather than to whichever node reused the slot.
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Structural role of a node, fixed when it is created.
pub enum NodeKind {
    /// Value-bearing field decoded from a byte span.
    Leaf,
    /// Pure container nesting other nodes.
    Group,
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// One element of the annotation tree.
pub struct TemplateNode {
    label: Option<String>,
    value: Option<String>,
    kind: NodeKind,
    section: bool,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    ranges: Vec<ByteRange>,
}

impl TemplateNode {
    pub(crate) fn leaf(label: Option<String>, value: Option<String>) -> Self {
        Self {
            label,
            value,
            kind: NodeKind::Leaf,
            section: false,
            parent: None,
            children: Vec::new(),
            ranges: Vec::new(),
        }
    }

    pub(crate) fn group(label: Option<String>, section: bool) -> Self {
        Self {
            label,
            value: None,
            kind: NodeKind::Group,
            section,
            parent: None,
            children: Vec::new(),
            ranges: Vec::new(),
        }
    }

    #[must_use]
    /// Field or group name, if the template gave one.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Replace the label.
    pub fn set_label(&mut self, label: Option<String>) {
        self.label = label;
    }

    #[must_use]
    /// Decoded value text; always `None` for groups.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Replace the decoded value of a leaf.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::ValueOnGroup`] when called on a group. The id is only used to
    /// describe the failure.
    pub(crate) fn set_value_checked(
        &mut self,
        id: NodeId,
        value: Option<String>,
    ) -> Result<(), TreeError> {
        if self.is_group() && value.is_some() {
            return Err(TreeError::ValueOnGroup(id));
        }
        self.value = value;
        Ok(())
    }

    #[must_use]
    /// Structural role chosen at construction.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    /// Whether this node is a pure container.
    pub fn is_group(&self) -> bool {
        self.kind == NodeKind::Group
    }

    #[must_use]
    /// Whether presentation should render a section break for this node.
    pub fn is_section(&self) -> bool {
        self.section
    }

    #[must_use]
    /// Enclosing node, absent for a root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    /// Directly nested nodes in template order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    /// Byte intervals claimed by this node, in insertion order until merged.
    pub fn ranges(&self) -> &[ByteRange] {
        &self.ranges
    }

    /// Claim another byte interval.
    ///
    /// A zero `length` is ignored so best-effort builders can report empty fields. Nothing is
    /// merged and neither parent nor children are touched.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::RangeOverflow`] if `location + length` exceeds `u64::MAX`; the node
    /// is left unchanged.
    pub fn add_range(&mut self, location: u64, length: u64) -> Result<(), TreeError> {
        match ByteRange::new(location, length) {
            Ok(range) => {
                self.ranges.push(range);
                Ok(())
            }
            Err(TreeError::EmptyRange(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Normalise this node's own ranges into a sorted, disjoint, non-adjacent set.
    ///
    /// Children are not visited.
    pub fn merge_ranges(&mut self) {
        let before = self.ranges.len();
        range::merge_ranges(&mut self.ranges);
        if before != self.ranges.len() {
            debug!(
                "merged {before} ranges into {} for {:?}",
                self.ranges.len(),
                self.label
            );
        }
    }

    #[must_use]
    /// Whether any claimed interval covers `offset`.
    pub fn contains_offset(&self, offset: u64) -> bool {
        self.ranges.iter().any(|r| r.contains(offset))
    }

    #[must_use]
    /// Bytes claimed by this node; exact once the ranges are merged.
    pub fn covered_len(&self) -> u64 {
        range::covered_len(&self.ranges)
    }

    pub(crate) fn extend_ranges(&mut self, ranges: &[ByteRange]) {
        self.ranges.extend_from_slice(ranges);
    }
}
