//! Token-cost estimation for budget comparisons.
//!
//! Every budget comparison in one run goes through [`estimate_tokens`]: the
//! chunker measures candidate subtrees against the chunk budget with it, and
//! the completion client derives the generation allowance from it. The
//! absolute scale is a heuristic; what matters is that it is deterministic
//! and applied uniformly.

/// Estimate the number of completion-API tokens in `text`.
///
/// Uses the rough BPE rule of thumb of one token per four bytes of English
/// text, rounded up. Intentionally pessimism-free: the chunk budget is
/// chosen with headroom below the model window, so a coarse estimate is
/// sufficient for comparisons.
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}
