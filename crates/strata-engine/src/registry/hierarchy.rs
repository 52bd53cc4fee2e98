use std::collections::HashMap;

use crate::error::{CoreError, Result};
use crate::id::ObjectId;

/// Outcome of [`Hierarchy::attach`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Attach {
    /// The node had no parent and now has one.
    Attached,
    /// The node moved from `previous` to the new parent.
    Reattached { previous: ObjectId },
    /// The node already had this parent; nothing changed.
    Unchanged,
}

impl Attach {
    #[inline]
    pub fn changed(self) -> bool {
        self != Attach::Unchanged
    }
}

/// Parent/child side table, independent of what the nodes are.
///
/// Invariants:
/// - a node has at most one parent
/// - `children[p]` lists exactly the nodes whose parent is `p`, in attachment order
/// - the graph is acyclic (checked on every attach)
#[derive(Debug, Default)]
pub struct Hierarchy {
    parents: HashMap<ObjectId, ObjectId>,
    children: HashMap<ObjectId, Vec<ObjectId>>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn parent(&self, node: ObjectId) -> Option<ObjectId> {
        self.parents.get(&node).copied()
    }

    #[inline]
    pub fn children(&self, node: ObjectId) -> &[ObjectId] {
        self.children.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of parent/child edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.parents.len()
    }

    /// Iterates from the node's parent up to its root.
    pub fn ancestors(&self, node: ObjectId) -> Ancestors<'_> {
        Ancestors {
            hierarchy: self,
            next: self.parent(node),
        }
    }

    /// Returns `true` if `ancestor` is on the parent chain of `node`.
    pub fn is_ancestor(&self, ancestor: ObjectId, node: ObjectId) -> bool {
        self.ancestors(node).any(|a| a == ancestor)
    }

    /// Attaches `child` under `parent`, replacing any previous edge.
    pub fn attach(&mut self, child: ObjectId, parent: ObjectId) -> Result<Attach> {
        if child == parent {
            return Err(CoreError::InvalidParent {
                child,
                parent,
                reason: "a node cannot be its own parent",
            });
        }
        if self.is_ancestor(child, parent) {
            return Err(CoreError::InvalidParent {
                child,
                parent,
                reason: "the new parent is a descendant of the node",
            });
        }

        let previous = self.parent(child);
        if previous == Some(parent) {
            return Ok(Attach::Unchanged);
        }

        if let Some(prev) = previous {
            self.unlink(prev, child);
        }
        self.parents.insert(child, parent);
        self.children.entry(parent).or_default().push(child);

        Ok(match previous {
            Some(previous) => Attach::Reattached { previous },
            None => Attach::Attached,
        })
    }

    /// Removes the edge above `child`. Returns the former parent.
    pub fn detach(&mut self, child: ObjectId) -> Option<ObjectId> {
        let parent = self.parents.remove(&child)?;
        self.unlink(parent, child);
        Some(parent)
    }

    /// Returns `root` and all its descendants, children before parents.
    pub fn subtree_post_order(&self, root: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        // (node, children visited)
        let mut stack = vec![(root, false)];

        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                out.push(node);
                continue;
            }
            stack.push((node, true));
            for &child in self.children(node).iter().rev() {
                stack.push((child, false));
            }
        }

        out
    }

    /// Drops every edge touching `node`. Children become roots.
    pub fn forget(&mut self, node: ObjectId) {
        self.detach(node);
        if let Some(children) = self.children.remove(&node) {
            for child in children {
                self.parents.remove(&child);
            }
        }
    }

    fn unlink(&mut self, parent: ObjectId, child: ObjectId) {
        if let Some(list) = self.children.get_mut(&parent) {
            list.retain(|&c| c != child);
            if list.is_empty() {
                self.children.remove(&parent);
            }
        }
    }
}

/// Iterator over a node's ancestors, nearest first.
pub struct Ancestors<'a> {
    hierarchy: &'a Hierarchy,
    next: Option<ObjectId>,
}

impl Iterator for Ancestors<'_> {
    type Item = ObjectId;

    fn next(&mut self) -> Option<ObjectId> {
        let current = self.next?;
        self.next = self.hierarchy.parent(current);
        Some(current)
    }
}
