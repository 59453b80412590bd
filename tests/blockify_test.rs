//! Chunking tests over realistic email documents.
//!
//! The load-bearing properties: chunking always terminates, never returns
//! an empty sequence for a document with content, preserves document order,
//! and covers every content leaf exactly once.

use dysmail::{chunk_document, estimate_tokens};
use proptest::prelude::*;

/// A plausible promotional-email skeleton: nested tables, inline styles,
/// a repeated row structure.
fn sample_email(rows: usize) -> String {
    let mut body = String::from(
        r#"<table width="600" cellpadding="0" cellspacing="0"><tbody>"#,
    );
    for i in 0..rows {
        body.push_str(&format!(
            r#"<tr><td style="padding: 12px"><h2>Offer {i}</h2><p>Save big on item {i}, this week only. Use code SAVE{i} at checkout for an extra discount on your next order.</p><a href="https://shop.example.com/item/{i}">Shop now</a></td></tr>"#
        ));
    }
    body.push_str("</tbody></table>");
    format!("<html><head><title>Sale</title></head><body>{body}</body></html>")
}

#[test]
fn test_small_email_is_single_fragment() {
    let fragments = chunk_document(&sample_email(2), 4000).expect("should chunk");
    assert_eq!(fragments.len(), 1);
    assert!(fragments[0].starts_with("<body>"));
    assert!(fragments[0].contains("Offer 0"));
    assert!(fragments[0].contains("Offer 1"));
}

#[test]
fn test_large_email_splits_under_budget() {
    let budget = 80;
    let fragments = chunk_document(&sample_email(20), budget).expect("should chunk");
    assert!(fragments.len() > 1);
    for fragment in &fragments {
        assert!(
            estimate_tokens(fragment) <= budget,
            "fragment exceeds budget: {fragment}"
        );
    }
}

#[test]
fn test_fragments_preserve_document_order() {
    let fragments = chunk_document(&sample_email(20), 80).expect("should chunk");
    let joined = fragments.join("");
    let mut last = 0;
    for i in 0..20 {
        let pos = joined
            .find(&format!("Offer {i}</h2>"))
            .unwrap_or_else(|| panic!("Offer {i} missing from output"));
        assert!(pos >= last, "Offer {i} out of order");
        last = pos;
    }
}

#[test]
fn test_every_row_covered_exactly_once() {
    let fragments = chunk_document(&sample_email(20), 80).expect("should chunk");
    let joined = fragments.join("");
    for i in 0..20 {
        let marker = format!("SAVE{i} ");
        assert_eq!(
            joined.matches(&marker).count(),
            1,
            "row {i} not covered exactly once"
        );
    }
}

#[test]
fn test_head_content_is_not_chunked() {
    let fragments = chunk_document(&sample_email(2), 4000).expect("should chunk");
    assert!(!fragments[0].contains("<title>"));
}

// ============================================================================
// Property tests
// ============================================================================

/// Tree shapes for coverage testing; leaves are numbered after generation.
#[derive(Debug, Clone)]
enum Shape {
    Leaf,
    Node(Vec<Shape>),
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    let leaf = Just(Shape::Leaf);
    leaf.prop_recursive(4, 24, 5, |inner| {
        prop::collection::vec(inner, 1..5).prop_map(Shape::Node)
    })
}

/// Render a shape to HTML with fixed-width leaf markers (`L0007E`), so each
/// marker appears in the source exactly once and substring counting is
/// unambiguous.
fn render(shape: &Shape, next_leaf: &mut usize, out: &mut String) {
    match shape {
        Shape::Leaf => {
            out.push_str(&format!("<p>L{:04}E</p>", *next_leaf));
            *next_leaf += 1;
        }
        Shape::Node(children) => {
            out.push_str("<div>");
            for child in children {
                render(child, next_leaf, out);
            }
            out.push_str("</div>");
        }
    }
}

proptest! {
    #[test]
    fn prop_every_leaf_covered_exactly_once(
        shape in shape_strategy(),
        budget in 1usize..200,
    ) {
        let mut html = String::from("<html><body>");
        let mut leaves = 0;
        render(&shape, &mut leaves, &mut html);
        html.push_str("</body></html>");

        let fragments = chunk_document(&html, budget).expect("should chunk");
        prop_assert!(!fragments.is_empty());

        let joined = fragments.join("");
        for i in 0..leaves {
            let marker = format!("L{i:04}E");
            prop_assert_eq!(
                joined.matches(&marker).count(),
                1,
                "leaf {} not covered exactly once",
                i
            );
        }
    }

    #[test]
    fn prop_fits_or_is_leaf(
        shape in shape_strategy(),
        budget in 10usize..200,
    ) {
        let mut html = String::from("<html><body>");
        let mut leaves = 0;
        render(&shape, &mut leaves, &mut html);
        html.push_str("</body></html>");

        // Oversized fragments are only ever childless nodes; with every
        // leaf under 10 estimated tokens, nothing can exceed this budget.
        for fragment in chunk_document(&html, budget).expect("should chunk") {
            prop_assert!(estimate_tokens(&fragment) <= budget.max(4));
        }
    }
}
