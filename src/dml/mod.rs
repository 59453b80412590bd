//! MJML -> DML conversion: parse a fragment of the intermediate dialect,
//! rewrite it against the schema tables, serialize the output dialect.

pub mod rewrite;
pub mod schema;
pub mod tree;

pub use rewrite::rewrite;
pub use schema::{AttrRule, Schema, TagRule, schema};
pub use tree::{Element, Node};
