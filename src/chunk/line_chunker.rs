//! Line-oriented chunking.
//!
//! Chunks are cut at line boundaries. A single line whose estimate alone
//! exceeds the budget is hard-split at character boundaries, so every chunk
//! stays within the budget and the chunks concatenate back to the input.

use crate::domain::TextChunk;
use crate::utils::tokens::CHARS_PER_TOKEN;
use crate::utils::{estimate_tokens_for_chars, stable_hash};

pub struct LineChunker {
    max_tokens: usize,
}

impl LineChunker {
    /// A `max_tokens` of zero is treated as one.
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens: max_tokens.max(1) }
    }

    pub fn chunk(&self, relative_path: &str, content: &str) -> Vec<TextChunk> {
        let mut builder = ChunkBuilder::new(relative_path);
        let max_chars = self.max_tokens.saturating_mul(CHARS_PER_TOKEN);

        for (idx, line) in content.split_inclusive('\n').enumerate() {
            let line_no = idx + 1;
            let line_chars = line.chars().count();

            if estimate_tokens_for_chars(line_chars) > self.max_tokens {
                builder.flush();
                for piece in split_at_char_count(line, max_chars) {
                    builder.push(piece, piece.chars().count(), line_no);
                    builder.flush();
                }
                continue;
            }

            if estimate_tokens_for_chars(builder.chars + line_chars) > self.max_tokens {
                builder.flush();
            }
            builder.push(line, line_chars, line_no);
        }

        builder.finish()
    }
}

struct ChunkBuilder<'a> {
    path: &'a str,
    chunks: Vec<TextChunk>,
    current: String,
    chars: usize,
    start_line: usize,
    end_line: usize,
}

impl<'a> ChunkBuilder<'a> {
    fn new(path: &'a str) -> Self {
        Self {
            path,
            chunks: Vec::new(),
            current: String::new(),
            chars: 0,
            start_line: 0,
            end_line: 0,
        }
    }

    fn push(&mut self, text: &str, chars: usize, line_no: usize) {
        if self.current.is_empty() {
            self.start_line = line_no;
        }
        self.current.push_str(text);
        self.chars += chars;
        self.end_line = line_no;
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let content = std::mem::take(&mut self.current);
        self.chunks.push(TextChunk {
            id: stable_hash(&content, self.path, self.start_line, self.end_line),
            path: self.path.to_string(),
            index: self.chunks.len(),
            start_line: self.start_line,
            end_line: self.end_line,
            token_estimate: estimate_tokens_for_chars(self.chars),
            content,
        });
        self.chars = 0;
    }

    fn finish(mut self) -> Vec<TextChunk> {
        self.flush();
        self.chunks
    }
}

/// Split `text` into pieces of at most `max_chars` characters.
fn split_at_char_count(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (byte_idx, _) in text.char_indices() {
        if count == max_chars {
            pieces.push(&text[start..byte_idx]);
            start = byte_idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::join_chunks;
    use crate::utils::estimate_tokens;

    fn numbered_lines(count: usize, width: usize) -> String {
        (0..count).map(|i| format!("{:0width$}\n", i, width = width)).collect()
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        assert!(LineChunker::new(10).chunk("a.txt", "").is_empty());
    }

    #[test]
    fn small_content_is_one_chunk() {
        let chunks = LineChunker::new(100).chunk("a.txt", "one\ntwo\nthree");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 3);
        assert_eq!(chunks[0].content, "one\ntwo\nthree");
    }

    #[test]
    fn chunks_cut_at_line_boundaries_within_budget() {
        // 10-char lines (9 digits + newline); 5 tokens = 20 chars = 2 lines per chunk.
        let content = numbered_lines(7, 9);
        let chunks = LineChunker::new(5).chunk("a.txt", &content);

        assert_eq!(chunks.len(), 4);
        for chunk in &chunks {
            assert!(chunk.token_estimate <= 5);
            assert_eq!(chunk.token_estimate, estimate_tokens(&chunk.content));
            assert!(chunk.content.ends_with('\n'));
        }
        assert_eq!((chunks[0].start_line, chunks[0].end_line), (1, 2));
        assert_eq!((chunks[3].start_line, chunks[3].end_line), (7, 7));
        assert_eq!(join_chunks(&chunks), content);
    }

    #[test]
    fn indices_are_sequential() {
        let content = numbered_lines(20, 9);
        let chunks = LineChunker::new(5).chunk("a.txt", &content);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.path, "a.txt");
        }
    }

    #[test]
    fn oversized_line_is_hard_split_on_char_boundaries() {
        let long_line = "é".repeat(30);
        let content = format!("short\n{long_line}\ntail\n");
        let chunks = LineChunker::new(3).chunk("a.txt", &content);

        assert_eq!(join_chunks(&chunks), content);
        for chunk in &chunks {
            assert!(chunk.token_estimate <= 3, "chunk over budget: {:?}", chunk.content);
        }
        let from_long_line: Vec<_> = chunks.iter().filter(|c| c.start_line == 2).collect();
        assert!(from_long_line.len() >= 3);
        assert!(from_long_line.iter().all(|c| c.end_line == 2));
    }

    #[test]
    fn crlf_content_round_trips() {
        let content = "a\r\nb\r\nc";
        let chunks = LineChunker::new(1).chunk("a.txt", content);
        assert_eq!(join_chunks(&chunks), content);
    }

    #[test]
    fn fifty_thousand_chars_split_into_many_bounded_chunks() {
        let line = format!("{}\n", "x".repeat(99));
        let content = line.repeat(500);
        assert_eq!(content.chars().count(), 50_000);

        let chunks = LineChunker::new(2000).chunk("big.txt", &content);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.token_estimate <= 2000);
            assert!(chunk.content.ends_with('\n'));
        }
        assert_eq!(join_chunks(&chunks), content);
    }

    #[test]
    fn zero_budget_is_clamped() {
        let chunker = LineChunker::new(0);
        let chunks = chunker.chunk("a.txt", "abcdefgh");
        assert_eq!(join_chunks(&chunks), "abcdefgh");
        assert_eq!(chunks.len(), 2);
    }
}
