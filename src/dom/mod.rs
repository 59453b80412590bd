//! Lightweight arena DOM for source HTML documents.
//!
//! The chunker owns one of these trees exclusively and consumes it
//! destructively: emitted subtrees are unlinked from their parent so they
//! cannot be visited twice. Nodes are addressed by [`NodeId`] into a flat
//! arena; unlinking detaches a node without invalidating any id.

mod sink;

pub use sink::parse_html;

use html5ever::QualName;

use crate::util::escape_xml;

/// Handle referencing a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// The document node, always present at index 0.
    pub const DOCUMENT: NodeId = NodeId(0);
}

/// An element attribute, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

/// Payload of one DOM node.
#[derive(Debug)]
pub enum NodeData {
    Document,
    Doctype,
    Element { name: QualName, attrs: Vec<Attr> },
    Text { contents: String },
    Comment,
}

/// One node: payload plus tree links.
#[derive(Debug)]
pub struct DomNode {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

/// Arena-backed document tree.
#[derive(Debug)]
pub struct Dom {
    nodes: Vec<DomNode>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        Self {
            nodes: vec![DomNode {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn document(&self) -> NodeId {
        NodeId::DOCUMENT
    }

    pub fn node(&self, id: NodeId) -> &DomNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut DomNode {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    fn push_node(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DomNode {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, name: QualName, attrs: Vec<Attr>) -> NodeId {
        self.push_node(NodeData::Element { name, attrs })
    }

    pub fn create_text(&mut self, contents: String) -> NodeId {
        self.push_node(NodeData::Text { contents })
    }

    pub fn create_comment(&mut self) -> NodeId {
        self.push_node(NodeData::Comment)
    }

    pub fn create_doctype(&mut self) -> NodeId {
        self.push_node(NodeData::Doctype)
    }

    /// Append `child` as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Append character data, merging with a trailing text node so the
    /// parser's character runs coalesce into one node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last = self.node(parent).children.last().copied();
        if let Some(last) = last
            && let NodeData::Text { contents } = &mut self.node_mut(last).data
        {
            contents.push_str(text);
            return;
        }
        let id = self.create_text(text.to_string());
        self.append(parent, id);
    }

    /// Insert `new` immediately before `sibling` under `sibling`'s parent.
    pub fn insert_before(&mut self, sibling: NodeId, new: NodeId) {
        let Some(parent) = self.node(sibling).parent else {
            return;
        };
        let pos = self.node(parent)
            .children
            .iter()
            .position(|&c| c == sibling)
            .unwrap_or(self.node(parent).children.len());
        self.node_mut(new).parent = Some(parent);
        self.node_mut(parent).children.insert(pos, new);
    }

    /// Unlink `child` from `parent`. The node stays in the arena but is no
    /// longer reachable from the document.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(parent).children.retain(|&c| c != child);
        self.node_mut(child).parent = None;
    }

    /// Unlink a node from whatever parent it currently has.
    pub fn remove_from_parent(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            self.remove_child(parent, id);
        }
    }

    /// Move all of `from`'s children to the end of `to`'s child list.
    pub fn reparent_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.node_mut(from).children);
        for child in children {
            self.node_mut(child).parent = Some(to);
            self.node_mut(to).children.push(child);
        }
    }

    /// Local tag name of an element node.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { name, .. } => Some(name.local.as_ref()),
            _ => None,
        }
    }

    /// Depth-first search for the first element with the given local name.
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.find_by_tag_from(NodeId::DOCUMENT, tag)
    }

    fn find_by_tag_from(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        if self.tag_name(id) == Some(tag) {
            return Some(id);
        }
        for &child in self.children(id) {
            if let Some(found) = self.find_by_tag_from(child, tag) {
                return Some(found);
            }
        }
        None
    }

    /// Serialize a node and its subtree back to markup.
    ///
    /// Doctypes and comments are not re-emitted: neither carries content
    /// worth spending prompt tokens on (conditional-comment soup in legacy
    /// email markup in particular). Void elements self-close in the XHTML
    /// style the downstream dialect expects.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, false, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, raw_text: bool, out: &mut String) {
        let node = self.node(id);
        match &node.data {
            NodeData::Document => {
                for &child in &node.children {
                    self.write_node(child, false, out);
                }
            }
            NodeData::Doctype | NodeData::Comment => {}
            NodeData::Text { contents } => {
                if raw_text {
                    out.push_str(contents);
                } else {
                    out.push_str(&escape_xml(contents));
                }
            }
            NodeData::Element { name, attrs } => {
                let tag = name.local.as_ref();
                out.push('<');
                out.push_str(tag);
                for attr in attrs {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    out.push_str(&escape_xml(&attr.value));
                    out.push('"');
                }
                if node.children.is_empty() && is_void_element(tag) {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                // style/script contents must not be entity-escaped
                let raw = matches!(tag, "style" | "script");
                for &child in &node.children {
                    self.write_node(child, raw, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
