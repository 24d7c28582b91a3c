//! Typed failures for tree construction and manifest loading.
//!
//! Every input to the tree is caller-controlled, so these describe contract violations rather
//! than runtime conditions. They are rejected before the tree is touched, which keeps the
//! structural invariants intact when an error is returned.

use crate::node::NodeId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Contract violations rejected by the template tree.
pub enum TreeError {
    /// The id refers to a node that was never created or has since been removed.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    /// Linking `node` under `parent` would make the node its own ancestor.
    #[error("cannot attach {node} under {parent}: it would become its own ancestor")]
    Cycle {
        /// Node being attached.
        node: NodeId,
        /// Requested parent, which is the node itself or one of its descendants.
        parent: NodeId,
    },
    /// `location + length` does not fit in 64 bits.
    #[error("range at {location:#x} with length {length:#x} overflows the 64-bit offset space")]
    RangeOverflow {
        /// Start offset of the rejected range.
        location: u64,
        /// Length of the rejected range.
        length: u64,
    },
    /// A zero-length range was handed to an operation that needs a non-empty interval.
    #[error("range at {0:#x} is empty")]
    EmptyRange(u64),
    /// Groups are pure containers and never carry a value.
    #[error("group node {0} cannot hold a value")]
    ValueOnGroup(NodeId),
}

#[derive(Debug, Error)]
/// Failures while reading a JSON manifest into a tree.
pub enum ManifestError {
    /// The manifest text is not valid JSON for the expected shape.
    #[error("invalid manifest JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The manifest describes a tree that breaks a structural invariant.
    #[error("invalid manifest tree: {0}")]
    Tree(#[from] TreeError),
    /// The tree nests deeper than a manifest can carry.
    #[error("manifest nests {depth} levels deep, the limit is {max}")]
    TooDeep {
        /// Depth reached, counting a top-level node as zero.
        depth: usize,
        /// Deepest nesting a manifest may describe.
        max: usize,
    },
}
