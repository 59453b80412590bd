//! Document chunking.
//!
//! Breaks an HTML document tree into an ordered sequence of self-contained
//! fragments, each estimated to fit under a token budget, so every piece can
//! be pushed through the completion API independently. Greedy depth-first:
//! a subtree that fits is emitted whole and consumed; a subtree that does
//! not is entered and split along its children. Chunking at tag boundaries
//! is deliberately lossy around container markup (the enclosing shells of a
//! split subtree are never themselves emitted) - most of what goes missing
//! is the verbose table scaffolding that carries no content.
//!
//! The traversal mutates the tree as fragments are consumed, so a tree can
//! be chunked exactly once.

use crate::dom::{self, Dom, NodeData, NodeId};
use crate::error::{Error, Result};
use crate::estimate::estimate_tokens;

/// Parse `html` and chunk its body into fragments under `budget` tokens.
///
/// The working tree lives and dies inside this call; only owned fragment
/// strings escape, in document order.
pub fn chunk_document(html: &str, budget: usize) -> Result<Vec<String>> {
    let mut dom = dom::parse_html(html);
    let body = dom.find_by_tag("body").ok_or(Error::NoBody)?;
    Ok(blockify(&mut dom, body, budget))
}

/// Chunk the subtree at `root` into serialized fragments.
///
/// Guarantees: terminates for any tree; the output is non-empty whenever the
/// subtree has any content; fragments appear in document pre-order of their
/// emission points; every content leaf ends up in exactly one fragment.
pub fn blockify(dom: &mut Dom, root: NodeId, budget: usize) -> Vec<String> {
    let mut fragments = Vec::new();

    let html = dom.outer_html(root);
    if estimate_tokens(&html) <= budget {
        fragments.push(html);
        return fragments;
    }

    consume_children(dom, root, budget, &mut fragments);
    fragments
}

fn consume_children(dom: &mut Dom, node: NodeId, budget: usize, out: &mut Vec<String>) {
    let children: Vec<NodeId> = dom.children(node).to_vec();
    for child in children {
        if is_structural_noise(dom, child) {
            continue;
        }

        let html = dom.outer_html(child);
        if estimate_tokens(&html) <= budget {
            out.push(html);
            dom.remove_child(node, child);
        } else if dom.children(child).is_empty() {
            // No finer split granularity exists. Emitting oversized is the
            // only way to keep the content at all.
            out.push(html);
            dom.remove_child(node, child);
        } else {
            consume_children(dom, child, budget, out);
        }
    }
}

/// Whitespace between block elements is formatting noise, not content;
/// emitting it as fragments would waste completion calls on indentation.
fn is_structural_noise(dom: &Dom, id: NodeId) -> bool {
    match &dom.node(id).data {
        NodeData::Comment | NodeData::Doctype => true,
        NodeData::Text { contents } => contents.trim().is_empty(),
        _ => false,
    }
}
