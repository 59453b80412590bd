//! html5ever TreeSink implementation for the arena [`Dom`].

use std::cell::RefCell;

use html5ever::parse_document;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, ParseOpts, QualName};

use super::{Attr, Dom, NodeData, NodeId};

/// Parse an HTML document leniently into a [`Dom`].
///
/// Real-world email markup is tag soup; the html5ever tree builder repairs
/// it the way a browser would instead of rejecting it.
pub fn parse_html(html: &str) -> Dom {
    let sink = DomSink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// TreeSink that builds a [`Dom`].
///
/// Uses interior mutability (RefCell) because html5ever's TreeSink trait
/// takes `&self` on every mutating method.
struct DomSink {
    dom: RefCell<Dom>,
    quirks_mode: RefCell<QuirksMode>,
}

impl DomSink {
    fn new() -> Self {
        Self {
            dom: RefCell::new(Dom::new()),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }

    fn into_dom(self) -> Dom {
        self.dom.into_inner()
    }
}

impl TreeSink for DomSink {
    type Handle = NodeId;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: std::borrow::Cow<'static, str>) {
        // Ignore parse errors - be lenient like browsers
    }

    fn get_document(&self) -> Self::Handle {
        self.dom.borrow().document()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let dom = self.dom.borrow();
        match &dom.node(*target).data {
            NodeData::Element { name, .. } => {
                // SAFETY: workaround for the trait's lifetime requirements.
                // The QualName lives in the arena owned by self; the tree
                // builder uses the returned reference immediately and never
                // holds it across another sink call, so it cannot observe
                // an arena reallocation. The borrow checker cannot see
                // through the RefCell, so the lifetime is extended manually.
                unsafe { std::mem::transmute::<&QualName, &'a QualName>(name) }
            }
            _ => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let converted: Vec<Attr> = attrs
            .into_iter()
            .map(|a| Attr {
                name: a.name.local.to_string(),
                value: a.value.to_string(),
            })
            .collect();

        self.dom.borrow_mut().create_element(name, converted)
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        self.dom.borrow_mut().create_comment()
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions carry nothing we serialize
        self.dom.borrow_mut().create_comment()
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => dom.append(*parent, node),
            NodeOrText::AppendText(text) => dom.append_text(*parent, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let parent = self.dom.borrow().node(*element).parent;
        match parent {
            Some(parent) => self.append(&parent, child),
            None => self.append(prev_element, child),
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        let mut dom = self.dom.borrow_mut();
        let doc = dom.document();
        let doctype = dom.create_doctype();
        dom.append(doc, doctype);
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut dom = self.dom.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => dom.insert_before(*sibling, node),
            NodeOrText::AppendText(text) => {
                let text_node = dom.create_text(text.to_string());
                dom.insert_before(*sibling, text_node);
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Html5Attribute>) {
        let mut dom = self.dom.borrow_mut();
        if let NodeData::Element { attrs: existing, .. } = &mut dom.node_mut(*target).data {
            for attr in attrs {
                let local = attr.name.local.to_string();
                if !existing.iter().any(|a| a.name == local) {
                    existing.push(Attr {
                        name: local,
                        value: attr.value.to_string(),
                    });
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.dom.borrow_mut().remove_from_parent(*target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        self.dom.borrow_mut().reparent_children(*node, *new_parent);
    }
}
