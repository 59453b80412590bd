//! Explicit markup tree for intermediate-dialect fragments.
//!
//! The rewriter operates on plain owned values: an element is its tag name,
//! its attributes in document order, and its children. Each rewrite pass
//! consumes one tree and builds the next, so no pass ever observes another
//! pass's partial mutations.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::util::escape_xml;

/// One node of a parsed fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element: tag, ordered attributes, ordered children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Look up an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a markup fragment into its top-level nodes.
///
/// Strict about structure (unclosed, mismatched, and stray closing tags are
/// errors - the caller falls back to passing the fragment through untouched)
/// but tolerant about vocabulary: the markup comes out of a text-generation
/// model, so the HTML entities such output habitually contains are resolved
/// rather than rejected. XML declarations, doctypes, comments, and
/// processing instructions are discarded.
pub fn parse(markup: &str) -> Result<Vec<Node>> {
    let mut reader = Reader::from_str(markup);

    let mut root = Element::new("#fragment");
    let mut stack: Vec<Element> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => stack.push(open_element(&e)),
            Ok(Event::Empty(e)) => {
                let element = open_element(&e);
                push_child(&mut root, &mut stack, Node::Element(element));
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let Some(element) = stack.pop() else {
                    return Err(Error::Malformed(format!("stray closing tag </{name}>")));
                };
                if element.tag != name {
                    return Err(Error::Malformed(format!(
                        "mismatched closing tag </{name}> for <{}>",
                        element.tag
                    )));
                }
                push_child(&mut root, &mut stack, Node::Element(element));
            }
            Ok(Event::Text(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                push_text(&mut root, &mut stack, &text);
            }
            Ok(Event::GeneralRef(e)) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                if let Some(resolved) = resolve_entity(&entity) {
                    push_text(&mut root, &mut stack, &resolved);
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                push_text(&mut root, &mut stack, &text);
            }
            Ok(Event::Decl(_)) | Ok(Event::PI(_)) | Ok(Event::DocType(_))
            | Ok(Event::Comment(_)) => {}
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
        }
    }

    if let Some(element) = stack.pop() {
        return Err(Error::Malformed(format!("unclosed tag <{}>", element.tag)));
    }

    Ok(root.children)
}

fn open_element(e: &BytesStart) -> Element {
    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut element = Element::new(tag);
    for attr in e.attributes().flatten() {
        let name = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value).into_owned();
        let value = match quick_xml::escape::unescape_with(&raw, |ent| resolve_entity_ref(ent)) {
            Ok(unescaped) => unescaped.into_owned(),
            Err(_) => raw,
        };
        element.attrs.push((name, value));
    }
    element
}

fn push_child(root: &mut Element, stack: &mut [Element], node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => root.children.push(node),
    }
}

fn push_text(root: &mut Element, stack: &mut [Element], text: &str) {
    if text.is_empty() {
        return;
    }
    let children = match stack.last_mut() {
        Some(parent) => &mut parent.children,
        None => &mut root.children,
    };
    // Adjacent runs (text / resolved entity / CDATA) merge into one node
    if let Some(Node::Text(existing)) = children.last_mut() {
        existing.push_str(text);
        return;
    }
    children.push(Node::Text(text.to_string()));
}

/// Resolve a general entity reference to its replacement text.
///
/// Covers the XML predefined five, numeric references, and the named HTML
/// entities that show up in model-generated email markup.
fn resolve_entity(entity: &str) -> Option<String> {
    if let Some(named) = resolve_entity_ref(entity) {
        return Some(named.to_string());
    }

    if let Some(hex) = entity.strip_prefix("#x") {
        if let Ok(code) = u32::from_str_radix(hex, 16)
            && let Some(c) = char::from_u32(code)
        {
            return Some(c.to_string());
        }
    } else if let Some(dec) = entity.strip_prefix('#')
        && let Ok(code) = dec.parse::<u32>()
        && let Some(c) = char::from_u32(code)
    {
        return Some(c.to_string());
    }

    None
}

fn resolve_entity_ref(entity: &str) -> Option<&'static str> {
    match entity {
        "apos" => Some("'"),
        "quot" => Some("\""),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "amp" => Some("&"),
        "nbsp" => Some("\u{a0}"),
        "shy" => Some("\u{ad}"),
        "copy" => Some("\u{a9}"),
        "reg" => Some("\u{ae}"),
        "trade" => Some("\u{2122}"),
        "mdash" => Some("\u{2014}"),
        "ndash" => Some("\u{2013}"),
        "hellip" => Some("\u{2026}"),
        "lsquo" => Some("\u{2018}"),
        "rsquo" => Some("\u{2019}"),
        "ldquo" => Some("\u{201c}"),
        "rdquo" => Some("\u{201d}"),
        "bull" => Some("\u{2022}"),
        "middot" => Some("\u{b7}"),
        "laquo" => Some("\u{ab}"),
        "raquo" => Some("\u{bb}"),
        "times" => Some("\u{d7}"),
        _ => None,
    }
}

/// Serialize top-level nodes back to markup text.
///
/// Never emits an XML declaration; empty elements self-close.
pub fn serialize(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(node, &mut out);
    }
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape_xml(text)),
        Node::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (name, value) in &element.attrs {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_xml(value));
                out.push('"');
            }
            if element.children.is_empty() {
                out.push_str(" />");
                return;
            }
            out.push('>');
            for child in &element.children {
                write_node(child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(markup: &str) -> Element {
        let nodes = parse(markup).expect("fragment should parse");
        match nodes.into_iter().next() {
            Some(Node::Element(element)) => element,
            other => panic!("expected an element, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_basic_element() {
        let element = parse_one(r#"<mj-button align="center">Go</mj-button>"#);
        assert_eq!(element.tag, "mj-button");
        assert_eq!(element.attr("align"), Some("center"));
        assert_eq!(element.children, vec![Node::Text("Go".into())]);
    }

    #[test]
    fn test_parse_preserves_attribute_order() {
        let element = parse_one(r#"<mj-image src="a.png" width="600px" alt="logo" />"#);
        let names: Vec<&str> = element.attrs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["src", "width", "alt"]);
    }

    #[test]
    fn test_parse_multiple_top_level_nodes() {
        let nodes = parse("<mj-text>a</mj-text><mj-text>b</mj-text>").expect("should parse");
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_parse_resolves_html_entities() {
        let element = parse_one("<mj-text>Terms&nbsp;&amp;&nbsp;Conditions&hellip;</mj-text>");
        assert_eq!(
            element.children,
            vec![Node::Text("Terms\u{a0}&\u{a0}Conditions\u{2026}".into())]
        );
    }

    #[test]
    fn test_parse_resolves_numeric_entities() {
        let element = parse_one("<mj-text>&#169; 2023 &#x2014; Acme</mj-text>");
        assert_eq!(
            element.children,
            vec![Node::Text("\u{a9} 2023 \u{2014} Acme".into())]
        );
    }

    #[test]
    fn test_parse_unescapes_attribute_values() {
        let element = parse_one(r#"<mj-button href="?a=1&amp;b=2" />"#);
        assert_eq!(element.attr("href"), Some("?a=1&b=2"));
    }

    #[test]
    fn test_unclosed_tag_is_an_error() {
        assert!(parse("<mj-section><mj-text>oops</mj-text>").is_err());
    }

    #[test]
    fn test_stray_closing_tag_is_an_error() {
        assert!(parse("<mj-text>hi</mj-text></mj-section>").is_err());
    }

    #[test]
    fn test_declaration_is_dropped() {
        let nodes = parse("<?xml version=\"1.0\"?><mj-text>hi</mj-text>").expect("should parse");
        let out = serialize(&nodes);
        assert_eq!(out, "<mj-text>hi</mj-text>");
    }

    #[test]
    fn test_serialize_roundtrip() {
        let markup = r#"<dys-row><dys-column width="50%"><dys-text>Hello</dys-text></dys-column></dys-row>"#;
        let nodes = parse(markup).expect("should parse");
        assert_eq!(serialize(&nodes), markup);
    }

    #[test]
    fn test_serialize_self_closes_empty_elements() {
        let nodes = parse("<mj-divider></mj-divider>").expect("should parse");
        assert_eq!(serialize(&nodes), "<mj-divider />");
    }

    #[test]
    fn test_serialize_escapes_text_and_attributes() {
        let nodes = vec![Node::Element(Element {
            tag: "dys-text".into(),
            attrs: vec![("title".into(), "a \"b\"".into())],
            children: vec![Node::Text("1 < 2 & 3".into())],
        })];
        assert_eq!(
            serialize(&nodes),
            r#"<dys-text title="a &quot;b&quot;">1 &lt; 2 &amp; 3</dys-text>"#
        );
    }
}
