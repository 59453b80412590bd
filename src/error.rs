//! Error types for dysmail operations.

use thiserror::Error;

/// Errors that can occur during conversion or pipeline execution.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed fragment: {0}")]
    Malformed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned no choices")]
    EmptyCompletion,

    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("document has no body element")]
    NoBody,

    #[error("a {prompt}-token prompt leaves no completion room within the {limit}-token model window")]
    BudgetTooLarge { prompt: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
