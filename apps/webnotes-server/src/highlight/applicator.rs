//! Highlight application
//!
//! Two tiers, tried in order:
//!
//! 1. [`surround`] wraps the whole range in one marker, like the DOM's
//!    `surroundContents`. It refuses ranges that partially contain an element.
//! 2. [`apply_segments`] wraps each text-node segment separately, replacing
//!    the node with `[before, marker, after]`.
//!
//! [`highlight`] runs both and never fails: when no marker can be placed the
//! caller still gets an outcome it can save as a plain record.

use crate::dom::{DomError, DomTree, NodeId, Range, Result};
use crate::locator::compute_path;

use super::palette::Color;
use super::segmenter::{segment, Segment};

pub const MARKER_TAG: &str = "span";
pub const MARKER_CLASS: &str = "webnotes-highlight";
pub const MARKER_FLAG_ATTRIBUTE: &str = "data-webnotes";
pub const MARKER_COLOR_ATTRIBUTE: &str = "data-color";

/// What happened when highlighting a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighlightOutcome {
    /// At least one marker was placed
    Highlighted {
        /// First marker, used as the anchor
        marker: NodeId,
        /// Number of markers created
        markers: usize,
        /// Structural path of the first marker
        locator: Option<String>,
    },
    /// The range held no text nodes to wrap
    SaveOnly,
    /// Both tiers failed while mutating the tree
    Degraded { error: DomError },
}

impl HighlightOutcome {
    pub fn locator(&self) -> Option<&str> {
        match self {
            HighlightOutcome::Highlighted { locator, .. } => locator.as_deref(),
            _ => None,
        }
    }

    pub fn is_visible(&self) -> bool {
        matches!(self, HighlightOutcome::Highlighted { .. })
    }
}

/// Create a detached marker element for `color`
pub fn create_marker<T: DomTree + ?Sized>(tree: &mut T, color: Color) -> Result<NodeId> {
    let marker = tree.create_element(MARKER_TAG);
    tree.set_attribute(marker, "class", MARKER_CLASS)?;
    tree.set_attribute(
        marker,
        "style",
        &format!("background-color: {}", color.marker_hex()),
    )?;
    tree.set_attribute(marker, MARKER_FLAG_ATTRIBUTE, "true")?;
    tree.set_attribute(marker, MARKER_COLOR_ATTRIBUTE, color.name())?;
    Ok(marker)
}

/// Whether `node` is a marker this crate created
pub fn is_marker<T: DomTree + ?Sized>(tree: &T, node: NodeId) -> bool {
    tree.attribute(node, MARKER_FLAG_ATTRIBUTE) == Some("true")
}

/// Every attached marker in document order, with its color
pub fn markers<T: DomTree + ?Sized>(tree: &T) -> Vec<(NodeId, Option<Color>)> {
    let mut found = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(node) = stack.pop() {
        if is_marker(tree, node) {
            let color = tree
                .attribute(node, MARKER_COLOR_ATTRIBUTE)
                .and_then(|c| c.parse().ok());
            found.push((node, color));
        }
        stack.extend(tree.children(node).into_iter().rev());
    }
    found
}

/// Wrap a range in a single marker without splitting across elements
///
/// Fails with [`DomError::PartialElement`] when the range starts and ends in
/// different elements, before touching the tree. A collapsed range is
/// [`DomError::InvalidRange`].
pub fn surround<T: DomTree + ?Sized>(tree: &mut T, range: &Range, color: Color) -> Result<NodeId> {
    if range.is_collapsed() {
        return Err(DomError::InvalidRange);
    }
    let start = range.start();
    let end = range.end();

    for node in tree
        .ancestors(start.node)
        .into_iter()
        .chain(tree.ancestors(end.node))
    {
        let holds_start = tree.contains(node, start.node);
        let holds_end = tree.contains(node, end.node);
        if holds_start != holds_end && !tree.is_text(node) {
            return Err(DomError::PartialElement(node));
        }
    }

    let ancestor = range.common_ancestor(tree);
    let container = if tree.is_text(ancestor) {
        tree.parent(ancestor).ok_or(DomError::Detached(ancestor))?
    } else {
        ancestor
    };

    // Split the end first so the start node keeps its identity.
    let stop = if tree.is_text(end.node) {
        if end.offset == 0 {
            Some(end.node)
        } else if end.offset < tree.text_len(end.node) {
            Some(tree.split_text(end.node, end.offset)?)
        } else {
            tree.next_sibling(end.node)
        }
    } else {
        tree.children(container).get(end.offset).copied()
    };

    let first = if tree.is_text(start.node) {
        if start.offset == 0 {
            Some(start.node)
        } else if start.offset < tree.text_len(start.node) {
            Some(tree.split_text(start.node, start.offset)?)
        } else {
            tree.next_sibling(start.node)
        }
    } else {
        tree.children(container).get(start.offset).copied()
    };

    let siblings = tree.children(container);
    let from = match first {
        Some(node) => siblings
            .iter()
            .position(|&c| c == node)
            .ok_or(DomError::NotAChild {
                parent: container,
                child: node,
            })?,
        None => siblings.len(),
    };
    let to = match stop {
        Some(node) => siblings
            .iter()
            .position(|&c| c == node)
            .ok_or(DomError::NotAChild {
                parent: container,
                child: node,
            })?,
        None => siblings.len(),
    };
    let moved: Vec<NodeId> = siblings[from..to.max(from)].to_vec();

    let marker = create_marker(tree, color)?;
    tree.insert_before(container, marker, siblings.get(from).copied())?;
    for node in moved {
        tree.append_child(marker, node)?;
    }
    Ok(marker)
}

/// Wrap each segment in its own marker, returning the first one
///
/// Empty spans are skipped.
pub fn apply_segments<T: DomTree + ?Sized>(
    tree: &mut T,
    segments: &[Segment],
    color: Color,
) -> Result<Option<NodeId>> {
    let mut first = None;
    for segment in segments.iter().filter(|s| !s.is_empty()) {
        let marker = wrap_segment(tree, segment, color)?;
        first.get_or_insert(marker);
    }
    Ok(first)
}

fn wrap_segment<T: DomTree + ?Sized>(
    tree: &mut T,
    segment: &Segment,
    color: Color,
) -> Result<NodeId> {
    let node = segment.node;
    if !tree.is_text(node) {
        return Err(DomError::NotText(node));
    }
    let parent = tree.parent(node).ok_or(DomError::Detached(node))?;

    let chars: Vec<char> = tree.text_content(node).chars().collect();
    if segment.end > chars.len() || segment.start > segment.end {
        return Err(DomError::IndexSize {
            offset: segment.end,
            length: chars.len(),
        });
    }
    let before: String = chars[..segment.start].iter().collect();
    let matched: String = chars[segment.start..segment.end].iter().collect();
    let after: String = chars[segment.end..].iter().collect();

    let marker = create_marker(tree, color)?;
    tree.set_text_content(marker, &matched)?;
    tree.replace_child(parent, marker, node)?;

    if !before.is_empty() {
        let text = tree.create_text(&before);
        tree.insert_before(parent, text, Some(marker))?;
    }
    if !after.is_empty() {
        let text = tree.create_text(&after);
        let reference = tree.next_sibling(marker);
        tree.insert_before(parent, text, reference)?;
    }

    Ok(marker)
}

/// Highlight a range, falling back from the atomic wrap to per-node wrapping
pub fn highlight<T: DomTree + ?Sized>(tree: &mut T, range: &Range, color: Color) -> HighlightOutcome {
    match surround(tree, range, color) {
        Ok(marker) => {
            return HighlightOutcome::Highlighted {
                marker,
                markers: 1,
                locator: compute_path(tree, Some(marker)),
            };
        }
        Err(e) => {
            tracing::debug!(error = %e, "Simple highlight failed, wrapping per text node");
        }
    }

    let segments = segment(tree, range);
    if segments.is_empty() {
        tracing::debug!("No text nodes in selection, saving without highlight");
        return HighlightOutcome::SaveOnly;
    }

    let markers = segments.iter().filter(|s| !s.is_empty()).count();
    match apply_segments(tree, &segments, color) {
        Ok(Some(marker)) => HighlightOutcome::Highlighted {
            marker,
            markers,
            locator: compute_path(tree, Some(marker)),
        },
        Ok(None) => HighlightOutcome::SaveOnly,
        Err(error) => {
            tracing::warn!(error = %error, "Highlight failed, saving without highlight");
            HighlightOutcome::Degraded { error }
        }
    }
}
