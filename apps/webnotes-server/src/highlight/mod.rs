//! Text highlighting
//!
//! Turns a page selection into styled marker elements:
//!
//! - `segmenter`: selection to per-text-node spans
//! - `applicator`: spans (or the whole range) to markers, with fallback
//! - `palette`: the five highlight colors

mod applicator;
mod palette;
mod segmenter;

pub use applicator::{
    apply_segments, create_marker, highlight, is_marker, markers, surround, HighlightOutcome,
    MARKER_CLASS, MARKER_COLOR_ATTRIBUTE, MARKER_FLAG_ATTRIBUTE, MARKER_TAG,
};
pub use palette::{Color, UnknownColor};
pub use segmenter::{segment, Segment};
