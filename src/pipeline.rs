//! End-to-end conversion pipeline.
//!
//! Stage order is fixed: chunk the whole document first (sequential - the
//! chunker destructively consumes one shared tree), then push every
//! fragment through text generation and rewriting. Fragments have no data
//! dependency on each other once chunking is done, so their conversions are
//! dispatched concurrently; results are collected by fragment position, not
//! completion order, and artifacts are addressable by original document
//! order (`output-0`, `output-1`, ...).

use std::path::PathBuf;

use futures::future::join_all;
use tracing::{debug, info};

use crate::blockify::chunk_document;
use crate::dml;
use crate::error::{Error, Result};
use crate::estimate::estimate_tokens;
use crate::openai::{MAX_MODEL_TOKENS, TextGenerator};

/// Prompt prefix for the HTML -> MJML conversion call.
const MJML_PROMPT: &str = "Convert the following portion of this HTML Email to MJML, \
avoid using mj-table where possible, except for images that should be side by side. \
If using <br> tags, ensure that they are self closing e.g. <br />. \
If content looks like a footer: social media icons should use mj-social:";

fn mjml_prompt(fragment: &str) -> String {
    format!("{MJML_PROMPT}\n{fragment}")
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    /// Number of fragments the document was split into.
    pub fragments: usize,
    /// Fragments the rewriter left unchanged (not-well-formed completions
    /// pass through byte-for-byte).
    pub unchanged: usize,
}

/// Orchestrates chunking, text generation, rewriting, and persistence.
pub struct Pipeline<'a> {
    generator: &'a dyn TextGenerator,
    out_dir: PathBuf,
    budget: usize,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline writing artifacts under `out_dir`.
    ///
    /// Validates up front that a maximal chunk plus the prompt template
    /// still leaves completion room in the model window, so no fragment can
    /// hit the budget check mid-run.
    pub fn new(
        generator: &'a dyn TextGenerator,
        out_dir: impl Into<PathBuf>,
        budget: usize,
    ) -> Result<Self> {
        let overhead = estimate_tokens(&mjml_prompt(""));
        if budget + overhead >= MAX_MODEL_TOKENS {
            return Err(Error::BudgetTooLarge {
                prompt: budget + overhead,
                limit: MAX_MODEL_TOKENS,
            });
        }
        Ok(Self {
            generator,
            out_dir: out_dir.into(),
            budget,
        })
    }

    /// Convert one HTML document; returns once every artifact is written.
    pub async fn run(&self, html: &str) -> Result<RunReport> {
        let fragments = chunk_document(html, self.budget)?;
        info!(count = fragments.len(), "split document into fragments");

        let mjml_dir = self.out_dir.join("mjml");
        let dml_dir = self.out_dir.join("dml");
        std::fs::create_dir_all(&mjml_dir)?;
        std::fs::create_dir_all(&dml_dir)?;

        let conversions = join_all(fragments.iter().enumerate().map(
            |(index, fragment)| async move {
                debug!(index, "requesting MJML conversion");
                self.generator.generate(&mjml_prompt(fragment)).await
            },
        ))
        .await;

        let mut unchanged = 0;
        for (index, conversion) in conversions.into_iter().enumerate() {
            let mjml = conversion?;
            std::fs::write(mjml_dir.join(format!("output-{index}.mjml")), &mjml)?;

            let rewritten = dml::rewrite(&mjml);
            if rewritten == mjml {
                unchanged += 1;
            }
            std::fs::write(dml_dir.join(format!("output-{index}.dml")), &rewritten)?;
        }

        info!(
            fragments = fragments.len(),
            unchanged, "wrote conversion artifacts"
        );

        Ok(RunReport {
            fragments: fragments.len(),
            unchanged,
        })
    }
}
