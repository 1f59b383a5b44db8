//! Boundary points, ranges and the page selection

use std::cmp::Ordering;

use super::{DomError, DomTree, NodeId, Result};

/// A position in the tree: a char offset inside a text node, or a child
/// index inside an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub node: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Order two boundary points by tree position
pub fn compare_points<T: DomTree + ?Sized>(
    tree: &T,
    a: &BoundaryPoint,
    b: &BoundaryPoint,
) -> Ordering {
    point_key(tree, a).cmp(&point_key(tree, b))
}

// Child-index path to the container, followed by the offset. Lexicographic
// order on these keys matches document order: an element boundary before
// child `i` sorts ahead of anything inside child `i`.
fn point_key<T: DomTree + ?Sized>(tree: &T, point: &BoundaryPoint) -> Vec<usize> {
    let mut key = tree.position_path(point.node);
    key.push(point.offset);
    key
}

fn max_offset<T: DomTree + ?Sized>(tree: &T, node: NodeId) -> Result<usize> {
    if tree.is_text(node) {
        Ok(tree.text_len(node))
    } else if tree.is_element(node) {
        Ok(tree.children(node).len())
    } else {
        Err(DomError::NodeNotFound(node))
    }
}

/// A contiguous span of the document between two boundary points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: BoundaryPoint,
    end: BoundaryPoint,
}

impl Range {
    /// Build a range, checking offsets and ordering
    pub fn new<T: DomTree + ?Sized>(
        tree: &T,
        start: BoundaryPoint,
        end: BoundaryPoint,
    ) -> Result<Self> {
        for point in [&start, &end] {
            let length = max_offset(tree, point.node)?;
            if point.offset > length {
                return Err(DomError::IndexSize {
                    offset: point.offset,
                    length,
                });
            }
        }
        if compare_points(tree, &start, &end) == Ordering::Greater {
            return Err(DomError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    /// Range covering `[start, end)` of a single text node
    pub fn within<T: DomTree + ?Sized>(
        tree: &T,
        node: NodeId,
        start: usize,
        end: usize,
    ) -> Result<Self> {
        Self::new(
            tree,
            BoundaryPoint::new(node, start),
            BoundaryPoint::new(node, end),
        )
    }

    pub fn start(&self) -> BoundaryPoint {
        self.start
    }

    pub fn end(&self) -> BoundaryPoint {
        self.end
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Deepest node containing both boundaries
    pub fn common_ancestor<T: DomTree + ?Sized>(&self, tree: &T) -> NodeId {
        tree.common_ancestor(self.start.node, self.end.node)
            .unwrap_or_else(|| tree.root())
    }

    /// The selected characters, in document order
    pub fn to_text<T: DomTree + ?Sized>(&self, tree: &T) -> String {
        let start_key = point_key(tree, &self.start);
        let end_key = point_key(tree, &self.end);
        let mut text = String::new();

        for node in tree.text_nodes_under(self.common_ancestor(tree)) {
            let length = tree.text_len(node);
            let path = tree.position_path(node);
            let key_at = |offset: usize| {
                let mut key = path.clone();
                key.push(offset);
                key
            };

            let from = if node == self.start.node {
                self.start.offset
            } else if key_at(0) >= start_key {
                0
            } else {
                continue;
            };

            let to = if node == self.end.node {
                self.end.offset
            } else if key_at(length) <= end_key {
                length
            } else if key_at(0) >= end_key {
                break;
            } else {
                length.min(from)
            };

            if from < to {
                text.extend(tree.text_content(node).chars().skip(from).take(to - from));
            }
        }

        text
    }
}

/// The user's current selection on a page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    range: Option<Range>,
}

impl Selection {
    pub fn empty() -> Self {
        Self { range: None }
    }

    pub fn from_range(range: Range) -> Self {
        Self { range: Some(range) }
    }

    pub fn range(&self) -> Option<&Range> {
        self.range.as_ref()
    }

    /// True when nothing is selected
    pub fn is_collapsed(&self) -> bool {
        self.range.map_or(true, |r| r.is_collapsed())
    }

    pub fn to_text<T: DomTree + ?Sized>(&self, tree: &T) -> String {
        self.range.map(|r| r.to_text(tree)).unwrap_or_default()
    }

    /// Drop the selection, as the page does after a highlight
    pub fn clear(&mut self) {
        self.range = None;
    }
}
