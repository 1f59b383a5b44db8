//! Range segmentation
//!
//! Splits a selection into per-text-node spans so each piece can be wrapped
//! without crossing element boundaries.

use crate::dom::{DomTree, NodeId, Range};

/// A half-open char span `[start, end)` inside one text node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

impl Segment {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// The covered characters
    pub fn text<T: DomTree + ?Sized>(&self, tree: &T) -> String {
        tree.text_content(self.node)
            .chars()
            .skip(self.start)
            .take(self.end.saturating_sub(self.start))
            .collect()
    }
}

/// Decompose a range into ordered text-node segments
///
/// Nodes before the start container are skipped and traversal stops at the
/// end container. A range whose boundaries sit in elements rather than text
/// nodes can come back empty; callers treat that as "cannot highlight".
pub fn segment<T: DomTree + ?Sized>(tree: &T, range: &Range) -> Vec<Segment> {
    let start = range.start();
    let end = range.end();

    if start.node == end.node && tree.is_text(start.node) {
        return vec![Segment {
            node: start.node,
            start: start.offset,
            end: end.offset,
        }];
    }

    let mut segments = Vec::new();
    let mut in_range = false;

    for node in tree.text_nodes_under(range.common_ancestor(tree)) {
        if node == start.node {
            in_range = true;
            segments.push(Segment {
                node,
                start: start.offset,
                end: tree.text_len(node),
            });
        } else if node == end.node {
            segments.push(Segment {
                node,
                start: 0,
                end: end.offset,
            });
            break;
        } else if in_range {
            segments.push(Segment {
                node,
                start: 0,
                end: tree.text_len(node),
            });
        }
    }

    tracing::trace!(count = segments.len(), "Segmented selection");
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{BoundaryPoint, Document};

    fn joined(doc: &Document, segments: &[Segment]) -> String {
        segments.iter().map(|s| s.text(doc)).collect()
    }

    #[test]
    fn test_single_node_fast_path() {
        let doc = Document::parse("<p>say hello world</p>").unwrap();
        let (node, offset) = doc.find_text("hello").unwrap();
        let range = Range::within(&doc, node, offset, offset + 11).unwrap();

        let segments = segment(&doc, &range);

        assert_eq!(
            segments,
            vec![Segment {
                node,
                start: 4,
                end: 15
            }]
        );
        assert_eq!(joined(&doc, &segments), "hello world");
    }

    #[test]
    fn test_two_sibling_elements() {
        let doc = Document::parse("<p><b>foo</b><i>bar</i></p>").unwrap();
        let foo = doc.find_text("foo").unwrap().0;
        let bar = doc.find_text("bar").unwrap().0;
        let range = Range::new(
            &doc,
            BoundaryPoint::new(foo, 0),
            BoundaryPoint::new(bar, 3),
        )
        .unwrap();

        let segments = segment(&doc, &range);

        assert_eq!(segments.len(), 2);
        assert_eq!(joined(&doc, &segments), "foobar");
        assert_eq!(joined(&doc, &segments), range.to_text(&doc));
    }

    #[test]
    fn test_spans_reconstruct_selection() {
        let doc = Document::parse(
            "<div><p>before start</p><p>middle <em>deep</em> tail</p><p>the end after</p></div>",
        )
        .unwrap();
        let first = doc.find_text("before").unwrap().0;
        let last = doc.find_text("the end").unwrap().0;
        let range = Range::new(
            &doc,
            BoundaryPoint::new(first, 7),
            BoundaryPoint::new(last, 7),
        )
        .unwrap();

        let segments = segment(&doc, &range);

        // "before start", "middle ", "deep", " tail", "the end after"
        assert_eq!(segments.len(), 5);
        assert_eq!(segments[0].start, 7);
        assert_eq!(segments[4], Segment { node: last, start: 0, end: 7 });
        assert_eq!(joined(&doc, &segments), "startmiddle deep tailthe end");
        assert_eq!(joined(&doc, &segments), range.to_text(&doc));
    }

    #[test]
    fn test_nodes_after_end_are_not_visited() {
        let doc = Document::parse("<p><b>one</b><b>two</b><b>three</b></p>").unwrap();
        let one = doc.find_text("one").unwrap().0;
        let two = doc.find_text("two").unwrap().0;
        let range = Range::new(&doc, BoundaryPoint::new(one, 1), BoundaryPoint::new(two, 2)).unwrap();

        let segments = segment(&doc, &range);

        assert_eq!(segments.len(), 2);
        assert!(segments.iter().all(|s| s.node != doc.find_text("three").unwrap().0));
    }

    #[test]
    fn test_element_only_boundaries_yield_nothing() {
        let doc = Document::parse("<div><p>alpha</p><p>beta</p></div>").unwrap();
        let root = doc.root();
        let range = Range::new(&doc, BoundaryPoint::new(root, 0), BoundaryPoint::new(root, 2)).unwrap();

        assert!(segment(&doc, &range).is_empty());
    }
}
