//! Schema-driven fragment rewriting.
//!
//! Three passes run in order, each consuming the previous pass's tree and
//! building a new one:
//!
//! 1. **Tag canonicalization** - rename into the output vocabulary, elide
//!    tags with no counterpart (splicing their children upward).
//! 2. **Attribute canonicalization** - apply the closed-world whitelist,
//!    keyed by the already-renamed tag.
//! 3. **Parent enforcement** - wrap top-of-fragment nodes whose tag demands
//!    a specific immediate parent.
//!
//! Passes 1-3 are total over any well-formed tree. The only failure mode is
//! the initial parse, and that is recovered locally: a fragment that is not
//! well-formed markup is passed through byte-for-byte rather than dropped,
//! so a bad completion never costs its position in the output sequence.

use tracing::warn;

use crate::error::Result;

use super::schema::{AttrRule, Schema, TagRule, schema};
use super::tree::{self, Element, Node};

/// Rewrite one fragment of intermediate markup into the output dialect.
pub fn rewrite(fragment: &str) -> String {
    match rewrite_fragment(fragment) {
        Ok(rewritten) => rewritten,
        Err(e) => {
            warn!(error = %e, "fragment is not well-formed; passing through unchanged");
            fragment.to_string()
        }
    }
}

fn rewrite_fragment(fragment: &str) -> Result<String> {
    let schema = schema();
    let nodes = tree::parse(fragment)?;
    let nodes = canonicalize_tags(nodes, schema);
    let nodes = canonicalize_attrs(nodes, schema);
    let nodes = enforce_parents(nodes, schema);
    Ok(tree::serialize(&nodes))
}

/// Pass 1: rename tags and elide the ones DML has no counterpart for.
///
/// Elision recurses before splicing, because an elided element's children
/// may themselves rename or elide (`mj-accordion` nests three levels of
/// elided structure).
fn canonicalize_tags(nodes: Vec<Node>, schema: &Schema) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) => out.push(Node::Text(text)),
            Node::Element(element) => match schema.tag_rule(&element.tag) {
                Some(TagRule::Elide) => {
                    out.extend(canonicalize_tags(element.children, schema));
                }
                Some(TagRule::Rename(renamed)) => out.push(Node::Element(Element {
                    tag: renamed.to_string(),
                    attrs: element.attrs,
                    children: canonicalize_tags(element.children, schema),
                })),
                None => out.push(Node::Element(Element {
                    tag: element.tag,
                    attrs: element.attrs,
                    children: canonicalize_tags(element.children, schema),
                })),
            },
        }
    }
    out
}

/// Pass 2: filter and rename attributes against the whitelist.
///
/// The whitelist is closed-world: an attribute survives only if the node's
/// output tag explicitly keeps it. Tags without a whitelist entry keep no
/// attributes at all.
fn canonicalize_attrs(nodes: Vec<Node>, schema: &Schema) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Text(text) => Node::Text(text),
            Node::Element(element) => {
                let Element { tag, attrs, children } = element;
                let attrs = attrs
                    .into_iter()
                    .filter_map(|(name, value)| match schema.attr_rule(&tag, &name) {
                        Some(AttrRule::Keep(kept)) => Some((kept.to_string(), value)),
                        Some(AttrRule::Drop) | None => None,
                    })
                    .collect();
                Node::Element(Element {
                    tag,
                    attrs,
                    children: canonicalize_attrs(children, schema),
                })
            }
        })
        .collect()
}

/// Pass 3: wrap top-of-fragment nodes that demand a specific parent.
///
/// Only fragment roots can violate a parent requirement: within the tree,
/// nesting came from the source structure. Wrapping repeats until the top
/// node carries no requirement, which keeps the pass correct if the table
/// ever grows chained requirements, and makes it idempotent (a synthesized
/// wrapper has no requirement of its own, so a second run changes nothing).
fn enforce_parents(nodes: Vec<Node>, schema: &Schema) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| match node {
            Node::Text(text) => Node::Text(text),
            Node::Element(mut element) => {
                while let Some(parent_tag) = schema.required_parent(&element.tag) {
                    element = Element {
                        tag: parent_tag.to_string(),
                        attrs: Vec::new(),
                        children: vec![Node::Element(element)],
                    };
                }
                Node::Element(element)
            }
        })
        .collect()
}
