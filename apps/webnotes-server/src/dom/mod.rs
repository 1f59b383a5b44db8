//! Document tree abstraction
//!
//! Highlighting mutates a live page tree that the extension does not own.
//! The algorithms in [`crate::highlight`] and [`crate::locator`] only talk to
//! the [`DomTree`] trait, so any tree that can split text nodes and move
//! children around can host them. [`Document`] is the arena-backed
//! implementation used by the service and the tests.
//!
//! Text offsets are counted in Unicode scalar values (`char`s), never bytes.

mod document;
mod range;
#[cfg(test)]
pub(crate) mod testing;

pub use document::Document;
pub use range::{compare_points, BoundaryPoint, Range, Selection};

use thiserror::Error;

/// Handle to a node inside a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// The node types highlighting cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
}

/// Errors raised by tree mutations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    #[error("Expected a text node: {0:?}")]
    NotText(NodeId),

    #[error("Expected an element: {0:?}")]
    NotElement(NodeId),

    #[error("Node has no parent: {0:?}")]
    Detached(NodeId),

    #[error("Offset {offset} is out of bounds (length {length})")]
    IndexSize { offset: usize, length: usize },

    #[error("Node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("Inserting {0:?} here would create a cycle")]
    HierarchyRequest(NodeId),

    #[error("Range partially contains a non-text node: {0:?}")]
    PartialElement(NodeId),

    #[error("Range start is after its end")]
    InvalidRange,

    #[error("Failed to parse document: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, DomError>;

/// Minimal mutable tree interface, modeled on the DOM operations that
/// highlighting needs.
pub trait DomTree {
    /// The document element
    fn root(&self) -> NodeId;

    /// Node type, or `None` for an unknown handle
    fn kind(&self, node: NodeId) -> Option<NodeKind>;

    /// Tag name for elements, as written in the source
    fn tag_name(&self, node: NodeId) -> Option<&str>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Text data for text nodes, concatenated descendant text for elements
    fn text_content(&self, node: NodeId) -> String;

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Create a detached element
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Create a detached text node
    fn create_text(&mut self, data: &str) -> NodeId;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    /// Replace the data of a text node, or all children of an element with a
    /// single text node
    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()>;

    /// Split a text node at `offset`; the original keeps `[0, offset)` and the
    /// returned node, inserted right after it, holds the rest.
    fn split_text(&mut self, node: NodeId, offset: usize) -> Result<NodeId>;

    /// Put `new_child` where `old_child` was; `old_child` becomes detached
    fn replace_child(&mut self, parent: NodeId, new_child: NodeId, old_child: NodeId)
        -> Result<()>;

    /// Insert `new_child` before `reference`, or at the end when `None`.
    /// A node that already has a parent is moved.
    fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    fn is_text(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Text)
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.kind(node) == Some(NodeKind::Element)
    }

    /// Length of a text node in chars (0 for elements)
    fn text_len(&self, node: NodeId) -> usize {
        if self.is_text(node) {
            self.text_content(node).chars().count()
        } else {
            0
        }
    }

    fn index_in_parent(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|&c| c == node)
    }

    fn previous_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == node)?;
        index.checked_sub(1).map(|i| siblings[i])
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let index = siblings.iter().position(|&c| c == node)?;
        siblings.get(index + 1).copied()
    }

    /// The node followed by its ancestors, nearest first
    fn ancestors(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = vec![node];
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// Inclusive containment
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).contains(&ancestor)
    }

    fn common_ancestor(&self, a: NodeId, b: NodeId) -> Option<NodeId> {
        let chain = self.ancestors(b);
        self.ancestors(a).into_iter().find(|n| chain.contains(n))
    }

    /// Child indices from the top of the tree down to `node`
    fn position_path(&self, node: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(index) = self.index_in_parent(current) {
            path.push(index);
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        path.reverse();
        path
    }

    /// Text nodes under `node` (inclusive) in document order
    fn text_nodes_under(&self, node: NodeId) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            match self.kind(current) {
                Some(NodeKind::Text) => found.push(current),
                Some(NodeKind::Element) => {
                    stack.extend(self.children(current).into_iter().rev());
                }
                None => {}
            }
        }
        found
    }
}
