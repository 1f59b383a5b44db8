//! Arena-backed document tree
//!
//! Nodes live in a flat vector and refer to each other by index. Removed or
//! replaced nodes stay in the arena, detached, so handles never dangle.

use super::{DomError, DomTree, NodeId, NodeKind, Result};

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An owned, mutable document tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Document {
    /// Create a document with an empty root element
    pub fn new(root_tag: &str) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.create_element(root_tag);
        doc
    }

    /// Parse well-formed (X)HTML markup
    ///
    /// Whitespace-only text nodes are kept because they are real text nodes
    /// in a browser too. Comments and processing instructions are dropped.
    pub fn parse(markup: &str) -> Result<Self> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let parsed = roxmltree::Document::parse_with_options(markup, options)
            .map_err(|e| DomError::Parse(e.to_string()))?;

        let source_root = parsed.root_element();
        let mut doc = Self::new(source_root.tag_name().name());
        let root = doc.root;
        doc.import_attributes(root, source_root)?;
        doc.import_children(root, source_root)?;
        Ok(doc)
    }

    fn import_attributes(&mut self, target: NodeId, source: roxmltree::Node<'_, '_>) -> Result<()> {
        for attr in source.attributes() {
            self.set_attribute(target, attr.name(), attr.value())?;
        }
        Ok(())
    }

    fn import_children(&mut self, target: NodeId, source: roxmltree::Node<'_, '_>) -> Result<()> {
        for child in source.children() {
            if child.is_element() {
                let element = self.create_element(child.tag_name().name());
                self.import_attributes(element, child)?;
                self.append_child(target, element)?;
                self.import_children(element, child)?;
            } else if child.is_text() {
                if let Some(text) = child.text() {
                    let node = self.create_text(text);
                    self.append_child(target, node)?;
                }
            }
        }
        Ok(())
    }

    /// Serialize the attached tree back to markup
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_node(self.root, &mut out);
        out
    }

    /// Serialize a single node and its descendants
    pub fn node_markup(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        let Some(entry) = self.nodes.get(node.0) else {
            return;
        };
        match &entry.data {
            NodeData::Text(text) => out.push_str(&escape(text, false)),
            NodeData::Element { tag, attributes } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", name, escape(value, true)));
                }
                if entry.children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for &child in &entry.children {
                    self.write_node(child, out);
                }
                out.push_str(&format!("</{}>", tag));
            }
        }
    }

    /// First attached text node containing `needle`, with the char offset
    /// of the match
    pub fn find_text(&self, needle: &str) -> Option<(NodeId, usize)> {
        self.text_nodes_under(self.root).into_iter().find_map(|node| {
            let text = self.text_content(node);
            text.find(needle)
                .map(|byte_index| (node, text[..byte_index].chars().count()))
        })
    }

    /// Attached element with the given `id` attribute
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self.attribute(node, "id") == Some(id) {
                return Some(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        None
    }

    /// Attached elements with the given tag, in document order
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self
                .tag_name(node)
                .is_some_and(|t| t.eq_ignore_ascii_case(tag))
            {
                found.push(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        found
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(DomError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(DomError::NodeNotFound(id))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    fn detach(&mut self, node: NodeId) -> Result<()> {
        if let Some(parent) = self.node(node)?.parent {
            self.node_mut(parent)?.children.retain(|&c| c != node);
            self.node_mut(node)?.parent = None;
        }
        Ok(())
    }

    fn ensure_element(&self, node: NodeId) -> Result<()> {
        match self.node(node)?.data {
            NodeData::Element { .. } => Ok(()),
            NodeData::Text(_) => Err(DomError::NotElement(node)),
        }
    }
}

impl DomTree for Document {
    fn root(&self) -> NodeId {
        self.root
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.nodes.get(node.0).map(|n| match n.data {
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::Text(_) => NodeKind::Text,
        })
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { tag, .. } => Some(tag.as_str()),
            NodeData::Text(_) => None,
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn text_content(&self, node: NodeId) -> String {
        match self.nodes.get(node.0).map(|n| &n.data) {
            Some(NodeData::Text(text)) => text.clone(),
            Some(NodeData::Element { .. }) => self
                .text_nodes_under(node)
                .into_iter()
                .filter_map(|t| match &self.nodes[t.0].data {
                    NodeData::Text(text) => Some(text.as_str()),
                    NodeData::Element { .. } => None,
                })
                .collect(),
            None => String::new(),
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Element { attributes, .. } => attributes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            NodeData::Text(_) => None,
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            tag: tag.to_string(),
            attributes: Vec::new(),
        })
    }

    fn create_text(&mut self, data: &str) -> NodeId {
        self.push(NodeData::Text(data.to_string()))
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        match &mut self.node_mut(node)?.data {
            NodeData::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(n, _)| n == name) {
                    Some(entry) => entry.1 = value.to_string(),
                    None => attributes.push((name.to_string(), value.to_string())),
                }
                Ok(())
            }
            NodeData::Text(_) => Err(DomError::NotElement(node)),
        }
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()> {
        if let NodeData::Text(data) = &mut self.node_mut(node)?.data {
            *data = text.to_string();
            return Ok(());
        }

        for child in self.children(node) {
            self.detach(child)?;
        }
        if !text.is_empty() {
            let text_node = self.create_text(text);
            self.append_child(node, text_node)?;
        }
        Ok(())
    }

    fn split_text(&mut self, node: NodeId, offset: usize) -> Result<NodeId> {
        let tail = match &mut self.node_mut(node)?.data {
            NodeData::Text(data) => {
                let length = data.chars().count();
                if offset > length {
                    return Err(DomError::IndexSize { offset, length });
                }
                let byte_index = data
                    .char_indices()
                    .nth(offset)
                    .map(|(i, _)| i)
                    .unwrap_or(data.len());
                data.split_off(byte_index)
            }
            NodeData::Element { .. } => return Err(DomError::NotText(node)),
        };

        let new_node = self.create_text(&tail);
        if let Some(parent) = self.parent(node) {
            let reference = self.next_sibling(node);
            self.insert_before(parent, new_node, reference)?;
        }
        Ok(new_node)
    }

    fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<()> {
        if self.parent(old_child) != Some(parent) {
            return Err(DomError::NotAChild {
                parent,
                child: old_child,
            });
        }
        if new_child == old_child {
            return Ok(());
        }
        self.insert_before(parent, new_child, Some(old_child))?;
        self.detach(old_child)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.ensure_element(parent)?;
        self.node(new_child)?;
        if self.contains(new_child, parent) {
            return Err(DomError::HierarchyRequest(new_child));
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
            if reference == new_child {
                return Ok(());
            }
        }

        self.detach(new_child)?;
        let siblings = &self.node(parent)?.children;
        let index = match reference {
            Some(reference) => siblings
                .iter()
                .position(|&c| c == reference)
                .ok_or(DomError::NotAChild {
                    parent,
                    child: reference,
                })?,
            None => siblings.len(),
        };
        self.node_mut(parent)?.children.insert(index, new_child);
        self.node_mut(new_child)?.parent = Some(parent);
        Ok(())
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize() {
        let doc = Document::parse(r#"<html><body><p id="a">Hello <b>bold</b> world</p></body></html>"#)
            .unwrap();

        assert_eq!(doc.tag_name(doc.root()), Some("html"));
        assert_eq!(
            doc.to_markup(),
            r#"<html><body><p id="a">Hello <b>bold</b> world</p></body></html>"#
        );

        let p = doc.element_by_id("a").unwrap();
        assert_eq!(doc.text_content(p), "Hello bold world");
        assert_eq!(doc.children(p).len(), 3);
    }

    #[test]
    fn test_parse_rejects_malformed_markup() {
        let result = Document::parse("<html><p>unclosed</html>");
        assert!(matches!(result, Err(DomError::Parse(_))));
    }

    #[test]
    fn test_split_text_counts_chars() {
        let mut doc = Document::parse("<p>héllo wörld</p>").unwrap();
        let text = doc.children(doc.root())[0];

        let tail = doc.split_text(text, 6).unwrap();

        assert_eq!(doc.text_content(text), "héllo ");
        assert_eq!(doc.text_content(tail), "wörld");
        assert_eq!(doc.children(doc.root()), vec![text, tail]);
    }

    #[test]
    fn test_split_text_out_of_bounds() {
        let mut doc = Document::parse("<p>abc</p>").unwrap();
        let text = doc.children(doc.root())[0];

        let err = doc.split_text(text, 4).unwrap_err();
        assert_eq!(err, DomError::IndexSize { offset: 4, length: 3 });
    }

    #[test]
    fn test_replace_child_detaches_old_node() {
        let mut doc = Document::parse("<p>old</p>").unwrap();
        let root = doc.root();
        let old = doc.children(root)[0];
        let new = doc.create_element("span");

        doc.replace_child(root, new, old).unwrap();

        assert_eq!(doc.children(root), vec![new]);
        assert_eq!(doc.parent(old), None);
        assert_eq!(doc.to_markup(), "<p><span/></p>");
    }

    #[test]
    fn test_replace_child_requires_child() {
        let mut doc = Document::parse("<p><a>x</a><b>y</b></p>").unwrap();
        let a = doc.elements_by_tag("a")[0];
        let b_text = doc.children(doc.elements_by_tag("b")[0])[0];
        let new = doc.create_text("z");

        let err = doc.replace_child(a, new, b_text).unwrap_err();
        assert!(matches!(err, DomError::NotAChild { .. }));
    }

    #[test]
    fn test_insert_before_moves_existing_node() {
        let mut doc = Document::parse("<p><a/><b/><i/></p>").unwrap();
        let root = doc.root();
        let [a, b, i] = [doc.children(root)[0], doc.children(root)[1], doc.children(root)[2]];

        doc.insert_before(root, i, Some(a)).unwrap();

        assert_eq!(doc.children(root), vec![i, a, b]);
    }

    #[test]
    fn test_insert_before_rejects_cycles() {
        let mut doc = Document::parse("<div><p><b/></p></div>").unwrap();
        let p = doc.elements_by_tag("p")[0];
        let b = doc.elements_by_tag("b")[0];

        let err = doc.append_child(b, p).unwrap_err();
        assert_eq!(err, DomError::HierarchyRequest(p));
    }

    #[test]
    fn test_set_text_content_on_element() {
        let mut doc = Document::parse("<p><b>x</b>y</p>").unwrap();
        let root = doc.root();

        doc.set_text_content(root, "fresh").unwrap();

        assert_eq!(doc.to_markup(), "<p>fresh</p>");
    }

    #[test]
    fn test_escaping() {
        let mut doc = Document::new("p");
        let root = doc.root();
        let text = doc.create_text("a < b & c");
        doc.append_child(root, text).unwrap();
        doc.set_attribute(root, "title", "say \"hi\"").unwrap();

        assert_eq!(
            doc.to_markup(),
            r#"<p title="say &quot;hi&quot;">a &lt; b &amp; c</p>"#
        );
    }

    #[test]
    fn test_find_text_reports_char_offset() {
        let doc = Document::parse("<p><b>ünïcode</b> then target</p>").unwrap();
        let (node, offset) = doc.find_text("target").unwrap();

        assert_eq!(doc.text_content(node), " then target");
        assert_eq!(offset, 6);
    }

    #[test]
    fn test_text_nodes_in_document_order() {
        let doc = Document::parse("<div>a<p>b<i>c</i></p>d</div>").unwrap();
        let texts: Vec<String> = doc
            .text_nodes_under(doc.root())
            .into_iter()
            .map(|n| doc.text_content(n))
            .collect();

        assert_eq!(texts, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_sibling_navigation() {
        let doc = Document::parse("<p><a/><b/><i/></p>").unwrap();
        let children = doc.children(doc.root());

        assert_eq!(doc.previous_sibling(children[0]), None);
        assert_eq!(doc.previous_sibling(children[1]), Some(children[0]));
        assert_eq!(doc.next_sibling(children[1]), Some(children[2]));
        assert_eq!(doc.next_sibling(children[2]), None);
    }
}
