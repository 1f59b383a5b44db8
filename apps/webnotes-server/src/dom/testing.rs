//! Tree doubles for exercising failure paths

use super::{Document, DomError, DomTree, NodeId, NodeKind, Result};

/// A page that can be read but refuses structural edits
///
/// Detached nodes can still be created and filled, the way a page script
/// might freeze its content while leaving `createElement` alone.
pub(crate) struct LockedPage {
    pub inner: Document,
}

impl LockedPage {
    pub fn parse(markup: &str) -> Self {
        Self {
            inner: Document::parse(markup).unwrap(),
        }
    }
}

impl DomTree for LockedPage {
    fn root(&self) -> NodeId {
        self.inner.root()
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.inner.kind(node)
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.inner.tag_name(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.inner.parent(node)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.inner.children(node)
    }

    fn text_content(&self, node: NodeId) -> String {
        self.inner.text_content(node)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.inner.attribute(node, name)
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.inner.create_element(tag)
    }

    fn create_text(&mut self, data: &str) -> NodeId {
        self.inner.create_text(data)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.inner.set_attribute(node, name, value)
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.inner.set_text_content(node, text)
    }

    fn split_text(&mut self, node: NodeId, _offset: usize) -> Result<NodeId> {
        Err(DomError::HierarchyRequest(node))
    }

    fn replace_child(
        &mut self,
        _parent: NodeId,
        new_child: NodeId,
        _old_child: NodeId,
    ) -> Result<()> {
        Err(DomError::HierarchyRequest(new_child))
    }

    fn insert_before(
        &mut self,
        _parent: NodeId,
        new_child: NodeId,
        _reference: Option<NodeId>,
    ) -> Result<()> {
        Err(DomError::HierarchyRequest(new_child))
    }
}
