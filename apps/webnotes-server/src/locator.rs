//! Structural path locators
//!
//! A locator names an element by the chain of `tag[n]` steps from the
//! document root, where `n` counts only same-tag element siblings
//! (1-based). It is a hint for finding a highlight again, not a durable key:
//! inserting a same-tag sibling earlier in the page shifts the index.
//!
//! Only generation is implemented. Resolving a locator back to an element
//! is left open.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::dom::{DomTree, NodeId};

/// Compute the structural path of an element
///
/// Returns `None` for an absent node or a node that is not an element.
pub fn compute_path<T: DomTree + ?Sized>(tree: &T, element: Option<NodeId>) -> Option<String> {
    let element = element?;
    let mut steps = Vec::new();
    let mut current = Some(element);

    while let Some(node) = current {
        let Some(tag) = tree.tag_name(node) else {
            break;
        };
        steps.push(LocatorStep {
            tag: tag.to_ascii_lowercase(),
            index: same_tag_index(tree, node, tag),
        });
        current = tree.parent(node);
    }

    if steps.is_empty() {
        return None;
    }
    steps.reverse();
    Some(Locator { steps }.to_string())
}

// 1 + number of earlier element siblings with the same tag
fn same_tag_index<T: DomTree + ?Sized>(tree: &T, node: NodeId, tag: &str) -> usize {
    let Some(parent) = tree.parent(node) else {
        return 1;
    };
    let earlier = tree
        .children(parent)
        .into_iter()
        .take_while(|&sibling| sibling != node)
        .filter(|&sibling| {
            tree.tag_name(sibling)
                .is_some_and(|t| t.eq_ignore_ascii_case(tag))
        })
        .count();
    earlier + 1
}

/// One `tag[index]` step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorStep {
    pub tag: String,
    pub index: usize,
}

/// Parsed form of a locator string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    pub steps: Vec<LocatorStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("Locator must start with '/': {0}")]
    MissingRoot(String),

    #[error("Invalid locator step: {0}")]
    InvalidStep(String),
}

impl Locator {
    pub fn parse(value: &str) -> Result<Self, LocatorError> {
        value.parse()
    }

    /// Depth of the located element (number of steps)
    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// The step naming the located element itself
    pub fn last(&self) -> Option<&LocatorStep> {
        self.steps.last()
    }
}

impl FromStr for Locator {
    type Err = LocatorError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let rest = value
            .strip_prefix('/')
            .ok_or_else(|| LocatorError::MissingRoot(value.to_string()))?;

        let steps = rest
            .split('/')
            .map(|raw| {
                let invalid = || LocatorError::InvalidStep(raw.to_string());
                let (tag, index) = raw
                    .strip_suffix(']')
                    .and_then(|s| s.split_once('['))
                    .ok_or_else(invalid)?;
                if tag.is_empty() || tag.contains([']', '[']) {
                    return Err(invalid());
                }
                let index: usize = index.parse().map_err(|_| invalid())?;
                if index == 0 {
                    return Err(invalid());
                }
                Ok(LocatorStep {
                    tag: tag.to_string(),
                    index,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { steps })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "/{}[{}]", step.tag, step.index)?;
        }
        Ok(())
    }
}
