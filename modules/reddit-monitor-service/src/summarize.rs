//! Hierarchical corpus summarization.
//!
//! Two fixed passes: the corpus is split into fixed-width chunks, each chunk
//! is summarized in order, then the joined chunk summaries are summarized
//! exactly once more. A corpus that fits one chunk takes the same two
//! passes.

use crate::error::PipelineError;
use crate::pipeline::RateCounter;
use async_trait::async_trait;

/// Bounded text summarizer. Input is capped at the configured chunk width;
/// output length bounds are fixed by the implementation.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, PipelineError>;
}

/// Fixed-width split by characters, not bytes, ignoring word boundaries.
/// The final chunk may be shorter; an input shorter than `max_chars`
/// (including the empty string) still produces one chunk.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let width = max_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Summarize one topic corpus. Any chunk failure aborts the whole topic
/// with no partial result; the caller decides whether other topics proceed.
pub async fn summarize_corpus(
    summarizer: &dyn Summarizer,
    corpus: &str,
    chunk_max_chars: usize,
    calls: &mut RateCounter,
) -> Result<String, PipelineError> {
    let chunks = split_chunks(corpus, chunk_max_chars);
    let mut parts = Vec::with_capacity(chunks.len());
    for chunk in &chunks {
        calls.record_call();
        parts.push(summarizer.summarize(chunk).await?);
    }

    let combined = parts.join(" ");
    calls.record_call();
    summarizer.summarize(&combined).await
}
