//! Arena holding every node of one template annotation.
//!
//! The builder populates exactly one tree while it walks a binary file, and presentation reads it
//! afterwards. Nodes are stored in generation-tagged slots: a parent owns its children through
//! the `children` id list, a child observes its parent through a plain id, and removing a subtree
//! frees its slots so no stale id can reach a removed node.

use crate::error::TreeError;
use crate::node::{NodeId, TemplateNode};
use log::{debug, warn};

#[derive(Clone, Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<TemplateNode>,
}

#[derive(Clone, Debug, Default)]
/// Owner of a template node tree (or forest of top-level nodes).
pub struct TemplateTree {
    slots: Vec<Slot>,
    free: Vec<usize>,
    roots: Vec<NodeId>,
    len: usize,
}

impl TemplateTree {
    #[must_use]
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    /// Whether the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    /// Top-level nodes in creation order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    #[must_use]
    /// Whether `id` refers to a live node of this tree.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    /// Look up a live node.
    pub fn get(&self, id: NodeId) -> Option<&TemplateNode> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    /// Look up a live node for label or range edits.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TemplateNode> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut TemplateNode, TreeError> {
        self.get_mut(id).ok_or(TreeError::UnknownNode(id))
    }

    /// Create a value-bearing leaf, appended as the last child of `parent` when given.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] if `parent` is not a live node.
    pub fn new_leaf(
        &mut self,
        label: Option<String>,
        value: Option<String>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        self.insert(TemplateNode::leaf(label, value), parent)
    }

    /// Create a group container, appended as the last child of `parent` when given.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] if `parent` is not a live node.
    pub fn new_group(
        &mut self,
        label: Option<String>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        self.insert(TemplateNode::group(label, false), parent)
    }

    /// Create a group that presentation renders as a section break.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] if `parent` is not a live node.
    pub fn new_section(
        &mut self,
        label: Option<String>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        self.insert(TemplateNode::group(label, true), parent)
    }

    fn insert(
        &mut self,
        node: TemplateNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return Err(TreeError::UnknownNode(parent));
            }
        }

        let id = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index: self.slots.len() - 1,
                generation: 0,
            }
        };
        self.len += 1;
        self.link(id, parent);
        debug!("created node {id} under {parent:?}");
        Ok(id)
    }

    /// Append `id` to the sibling list of `parent` and point its back-reference there.
    fn link(&mut self, id: NodeId, parent: Option<NodeId>) {
        match parent {
            Some(parent_id) => {
                if let Some(parent_node) = self.get_mut(parent_id) {
                    parent_node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = parent;
        }
    }

    /// Drop `id` from its current sibling list and clear its back-reference.
    fn unlink(&mut self, id: NodeId) {
        let parent = self.parent(id);
        let siblings = match parent {
            Some(parent_id) => self.get_mut(parent_id).map(|p| &mut p.children),
            None => Some(&mut self.roots),
        };
        if let Some(siblings) = siblings {
            siblings.retain(|sibling| *sibling != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }

    #[must_use]
    /// Enclosing node of `id`, absent for roots and unknown ids.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(TemplateNode::parent)
    }

    #[must_use]
    /// Children of `id` in template order; empty for unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[][..], TemplateNode::children)
    }

    #[must_use]
    /// Walk up the back-references from the parent of `id` to its root, nearest first.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    #[must_use]
    /// Nesting depth of `id`, zero for a root.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.get(id)?;
        Some(self.ancestors(id).count())
    }

    #[must_use]
    /// Top-level node whose subtree contains `id`.
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?;
        Some(self.ancestors(id).last().unwrap_or(id))
    }

    #[must_use]
    /// Whether `ancestor` lies strictly above `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    #[must_use]
    /// Pre-order walk over every node, yielding each id with its absolute depth.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            tree: self,
            stack: self.roots.iter().rev().map(|&id| (id, 0)).collect(),
        }
    }

    #[must_use]
    /// Pre-order walk over the subtree rooted at `id`, depths relative to `id`.
    pub fn walk_from(&self, id: NodeId) -> Walk<'_> {
        let stack = if self.contains(id) {
            vec![(id, 0)]
        } else {
            Vec::new()
        };
        Walk { tree: self, stack }
    }

    /// Every live node in document order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.walk().map(|(id, _)| id)
    }

    /// Every node strictly below `id`, in document order.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.walk_from(id).skip(1).map(|(id, _)| id)
    }

    /// Move `id` to the end of `new_parent`'s children, or to the end of the roots for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] for dead ids and [`TreeError::Cycle`] when
    /// `new_parent` is `id` itself or one of its descendants. The tree is unchanged on error.
    pub fn reparent(&mut self, id: NodeId, new_parent: Option<NodeId>) -> Result<(), TreeError> {
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        if let Some(parent) = new_parent {
            if !self.contains(parent) {
                return Err(TreeError::UnknownNode(parent));
            }
            if parent == id || self.is_ancestor(id, parent) {
                return Err(TreeError::Cycle { node: id, parent });
            }
        }
        self.unlink(id);
        self.link(id, new_parent);
        Ok(())
    }

    /// Destroy `id` together with its whole subtree and return how many nodes were reclaimed.
    ///
    /// The node is detached from its parent first; the parent itself is otherwise untouched.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] if `id` is not live.
    pub fn remove(&mut self, id: NodeId) -> Result<usize, TreeError> {
        if !self.contains(id) {
            return Err(TreeError::UnknownNode(id));
        }
        self.unlink(id);

        let doomed: Vec<NodeId> = self.walk_from(id).map(|(victim, _)| victim).collect();
        for victim in &doomed {
            if let Some(slot) = self.slots.get_mut(victim.index) {
                slot.node = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(victim.index);
            }
        }
        self.len -= doomed.len();
        debug!("removed node {id} and {} descendants", doomed.len() - 1);
        Ok(doomed.len())
    }

    /// Rename a node.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] if `id` is not live.
    pub fn set_label(&mut self, id: NodeId, label: Option<String>) -> Result<(), TreeError> {
        self.node_mut(id)?.set_label(label);
        Ok(())
    }

    /// Replace the decoded value of a leaf.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] if `id` is not live and [`TreeError::ValueOnGroup`]
    /// when setting a value on a group.
    pub fn set_value(&mut self, id: NodeId, value: Option<String>) -> Result<(), TreeError> {
        self.node_mut(id)?.set_value_checked(id, value)
    }

    /// Claim a byte interval for `id`. Zero-length intervals are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] if `id` is not live and [`TreeError::RangeOverflow`]
    /// if the interval ends past `u64::MAX`.
    pub fn add_range(&mut self, id: NodeId, location: u64, length: u64) -> Result<(), TreeError> {
        self.node_mut(id)?
            .add_range(location, length)
            .inspect_err(|e| warn!("rejected range for node {id}: {e}"))
    }

    /// Coalesce the ranges of `id` alone.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] if `id` is not live.
    pub fn merge_ranges(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.node_mut(id)?.merge_ranges();
        Ok(())
    }

    /// Coalesce the ranges of every live node, each against its own list only.
    pub fn merge_all_ranges(&mut self) {
        for node in self.slots.iter_mut().filter_map(|slot| slot.node.as_mut()) {
            node.merge_ranges();
        }
    }

    /// Copy the current ranges of `id` onto every ancestor.
    ///
    /// Groups only ever reflect what was explicitly added to them; this is the explicit step a
    /// builder takes when a group should cover its fields. Ancestors are not merged.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UnknownNode`] if `id` is not live.
    pub fn propagate_ranges(&mut self, id: NodeId) -> Result<(), TreeError> {
        let ranges = self
            .get(id)
            .ok_or(TreeError::UnknownNode(id))?
            .ranges()
            .to_vec();
        let ancestors: Vec<NodeId> = self.ancestors(id).collect();
        for ancestor in ancestors {
            if let Some(node) = self.get_mut(ancestor) {
                node.extend_ranges(&ranges);
            }
        }
        Ok(())
    }

    #[must_use]
    /// Deepest node whose ranges cover `offset`, the first in document order on ties.
    ///
    /// Maps a byte selected in the hex view back to the field that describes it.
    pub fn node_at_offset(&self, offset: u64) -> Option<NodeId> {
        let mut best: Option<(NodeId, usize)> = None;
        for (id, depth) in self.walk() {
            let covers = self.get(id).is_some_and(|node| node.contains_offset(offset));
            if covers && best.is_none_or(|(_, best_depth)| depth > best_depth) {
                best = Some((id, depth));
            }
        }
        best.map(|(id, _)| id)
    }
}

/// Iterator over the ancestors of a node, nearest first.
pub struct Ancestors<'a> {
    tree: &'a TemplateTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Pre-order iterator yielding `(id, depth)` pairs.
pub struct Walk<'a> {
    tree: &'a TemplateTree,
    stack: Vec<(NodeId, usize)>,
}

impl Iterator for Walk<'_> {
    type Item = (NodeId, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.stack.pop()?;
        self.stack.extend(
            self.tree
                .children(id)
                .iter()
                .rev()
                .map(|&child| (child, depth + 1)),
        );
        Some((id, depth))
    }
}

#[cfg(test)]
#[path = "tests/tree.rs"]
mod tests;
