//! DML schema: the rule tables driving the MJML -> DML rewrite.
//!
//! The schema is the single source of truth for the rewrite. The rewriter
//! itself is a generic interpreter; everything dialect-specific lives here:
//!
//! 1. **Tag rules** - how each input tag maps into the output vocabulary
//!    (rename, or elide the tag and splice its children upward).
//! 2. **Attribute rules** - a closed-world whitelist per *output* tag.
//!    Anything not explicitly kept is dropped.
//! 3. **Parent requirements** - output tags that must sit immediately under
//!    a specific output parent, enforced by synthesizing a wrapper.
//!
//! The tables are domain configuration, not derivable from the algorithm:
//! downstream rendering depends on the exact values.

use std::collections::HashMap;
use std::sync::OnceLock;

/// What to do with an input tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagRule {
    /// Relabel the element with an output-vocabulary name.
    Rename(&'static str),
    /// Remove the element and splice its children into its parent's child
    /// list at the same position.
    Elide,
}

/// What to do with an attribute on a given output tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrRule {
    /// Keep the attribute, possibly under a new name.
    Keep(&'static str),
    /// Remove the attribute. Listed explicitly so that load-bearing
    /// removals are visible in the table rather than implied by absence.
    Drop,
}

/// Immutable rule tables for one output dialect.
#[derive(Debug, Default)]
pub struct Schema {
    tag_rules: HashMap<&'static str, TagRule>,
    attr_rules: HashMap<&'static str, HashMap<&'static str, AttrRule>>,
    parent_rules: HashMap<&'static str, &'static str>,
}

/// The MJML -> DML schema, built once per process.
pub fn schema() -> &'static Schema {
    static SCHEMA: OnceLock<Schema> = OnceLock::new();
    SCHEMA.get_or_init(Schema::new)
}

impl Schema {
    fn new() -> Self {
        let mut schema = Self::default();
        schema.register_tag_rules();
        schema.register_attr_rules();
        schema.register_parent_rules();
        schema
    }

    /// Rule for an input tag; `None` means pass through unchanged.
    pub fn tag_rule(&self, tag: &str) -> Option<TagRule> {
        self.tag_rules.get(tag).copied()
    }

    /// Rule for `attr` on output tag `tag`; `None` means drop (the
    /// whitelist is closed-world).
    pub fn attr_rule(&self, tag: &str, attr: &str) -> Option<AttrRule> {
        self.attr_rules.get(tag).and_then(|rules| rules.get(attr)).copied()
    }

    /// Required immediate parent for an output tag, if any.
    pub fn required_parent(&self, tag: &str) -> Option<&'static str> {
        self.parent_rules.get(tag).copied()
    }

    fn rename(&mut self, from: &'static str, to: &'static str) {
        self.tag_rules.insert(from, TagRule::Rename(to));
    }

    fn elide(&mut self, tag: &'static str) {
        self.tag_rules.insert(tag, TagRule::Elide);
    }

    fn keep(&mut self, tag: &'static str, attrs: &[&'static str]) {
        let rules = self.attr_rules.entry(tag).or_default();
        for &attr in attrs {
            rules.insert(attr, AttrRule::Keep(attr));
        }
    }

    fn keep_as(&mut self, tag: &'static str, attr: &'static str, renamed: &'static str) {
        self.attr_rules.entry(tag).or_default().insert(attr, AttrRule::Keep(renamed));
    }

    fn drop_attr(&mut self, tag: &'static str, attr: &'static str) {
        self.attr_rules.entry(tag).or_default().insert(attr, AttrRule::Drop);
    }

    fn register_tag_rules(&mut self) {
        self.rename("mjml", "dys-block");
        self.rename("mj-section", "dys-row");
        self.rename("mj-column", "dys-column");
        self.rename("mj-text", "dys-text");
        self.rename("mj-button", "dys-button");
        self.rename("mj-image", "dys-img");
        self.rename("mj-divider", "dys-divider");
        self.rename("mj-spacer", "dys-spacer");
        self.rename("mj-wrapper", "dys-wrapper");
        self.rename("mj-social", "dys-social");
        self.rename("mj-social-element", "dys-social-element");
        self.rename("mj-raw", "dys-html");

        // DML has no counterpart for these; their content is kept by
        // splicing children upward.
        self.elide("mj-head");
        self.elide("mj-body");
        self.elide("mj-attributes");
        self.elide("mj-all");
        self.elide("mj-class");
        self.elide("mj-title");
        self.elide("mj-preview");
        self.elide("mj-font");
        self.elide("mj-style");
        self.elide("mj-breakpoint");
        self.elide("mj-navbar");
        self.elide("mj-navbar-link");
        self.elide("mj-accordion");
        self.elide("mj-accordion-element");
        self.elide("mj-accordion-title");
        self.elide("mj-accordion-text");
    }

    fn register_attr_rules(&mut self) {
        // dys-block and dys-html take no attributes: registering the tag
        // with an empty whitelist drops everything it arrives with.
        self.keep("dys-block", &[]);
        self.keep("dys-html", &[]);

        self.keep(
            "dys-row",
            &["background-color", "background-url", "padding", "full-width"],
        );
        self.keep(
            "dys-column",
            &[
                "width",
                "background-color",
                "padding",
                "vertical-align",
                "border",
                "border-radius",
            ],
        );
        self.keep(
            "dys-text",
            &[
                "align",
                "color",
                "font-family",
                "font-size",
                "font-weight",
                "line-height",
                "padding",
            ],
        );

        self.keep(
            "dys-button",
            &[
                "href",
                "align",
                "background-color",
                "color",
                "border-radius",
                "font-family",
                "font-size",
                "font-weight",
                "inner-padding",
                "padding",
                "target",
                "width",
                "height",
            ],
        );
        // models emit url= on buttons about as often as href=
        self.keep_as("dys-button", "url", "href");
        // tooltip titles render as literal text in some clients
        self.drop_attr("dys-button", "title");

        self.keep(
            "dys-img",
            &[
                "src",
                "href",
                "alt",
                "width",
                "height",
                "align",
                "padding",
                "border-radius",
                "target",
            ],
        );
        // template-editor bookmark, meaningless outside the source tool
        self.drop_attr("dys-img", "name");

        self.keep(
            "dys-divider",
            &["border-color", "border-style", "border-width", "padding", "width"],
        );
        self.keep("dys-spacer", &["height"]);
        self.keep("dys-wrapper", &["background-color", "padding", "full-width"]);
        self.keep("dys-social", &["align", "icon-size", "mode", "padding"]);
        self.keep("dys-social-element", &["name", "href", "src", "target"]);
    }

    fn register_parent_rules(&mut self) {
        self.parent_rules.insert("dys-column", "dys-row");
        self.parent_rules.insert("dys-social-element", "dys-social");
    }
}
