//! Chunking of large text files for summarization.

pub mod line_chunker;

pub use line_chunker::LineChunker;

use crate::domain::TextChunk;

/// Split `content` of the file at `relative_path` into chunks of at most
/// `max_tokens` estimated tokens each.
pub fn chunk_content(relative_path: &str, content: &str, max_tokens: usize) -> Vec<TextChunk> {
    LineChunker::new(max_tokens).chunk(relative_path, content)
}

/// Reassemble chunk contents in order.
pub fn join_chunks(chunks: &[TextChunk]) -> String {
    chunks.iter().map(|c| c.content.as_str()).collect()
}
