//! # dysmail
//!
//! Convert legacy HTML email templates to Dyspatch DML, using a
//! text-generation model for the HTML -> MJML leg and a schema-driven tree
//! rewrite for the MJML -> DML leg.
//!
//! ## How it works
//!
//! 1. **Chunk**: the source document is split into ordered fragments, each
//!    under a token budget, so arbitrarily large templates fit through the
//!    completion API ([`chunk_document`]).
//! 2. **Generate**: each fragment is converted to MJML by the completion
//!    model, concurrently across fragments ([`OpenAiClient`]).
//! 3. **Rewrite**: each MJML fragment is deterministically rewritten to DML
//!    by renaming tags, eliding structure DML lacks, whitelisting
//!    attributes, and wrapping tags that demand a specific parent
//!    ([`rewrite`]).
//!
//! ## Quick Start
//!
//! ```no_run
//! use dysmail::{OpenAiClient, Pipeline};
//!
//! # #[tokio::main]
//! # async fn main() -> dysmail::Result<()> {
//! let client = OpenAiClient::from_env("gpt-4o-mini")?;
//! let pipeline = Pipeline::new(&client, "out", 3000)?;
//!
//! let html = std::fs::read_to_string("newsletter.html")?;
//! let report = pipeline.run(&html).await?;
//! println!("converted {} fragments", report.fragments);
//! # Ok(())
//! # }
//! ```
//!
//! The MJML -> DML rewrite needs no network and can be used on its own:
//!
//! ```
//! let dml = dysmail::rewrite(r#"<mj-button align="center">Go</mj-button>"#);
//! assert_eq!(dml, r#"<dys-button align="center">Go</dys-button>"#);
//! ```

pub mod blockify;
pub mod dml;
pub mod dom;
pub mod error;
pub mod estimate;
pub mod openai;
pub mod pipeline;
pub mod util;

pub use blockify::{blockify, chunk_document};
pub use dml::rewrite;
pub use error::{Error, Result};
pub use estimate::estimate_tokens;
pub use openai::{DEFAULT_MODEL, MAX_MODEL_TOKENS, OpenAiClient, TextGenerator};
pub use pipeline::{Pipeline, RunReport};
