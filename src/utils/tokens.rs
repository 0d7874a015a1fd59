//! Token estimation.
//!
//! A fixed characters-per-token ratio; deterministic and monotonic in input
//! length, not tied to any real tokenizer.

/// Average characters per token assumed by the estimator.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimate tokens for a text blob.
pub fn estimate_tokens(text: &str) -> usize {
    estimate_tokens_for_chars(text.chars().count())
}

/// Estimate tokens for a text of `chars` Unicode scalar values.
pub fn estimate_tokens_for_chars(chars: usize) -> usize {
    chars.div_ceil(CHARS_PER_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_tokens() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn rounds_partial_tokens_up() {
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(estimate_tokens("ééééé"), 2);
    }

    #[test]
    fn monotonic_in_length() {
        let mut last = 0;
        let mut text = String::new();
        for _ in 0..64 {
            text.push('x');
            let now = estimate_tokens(&text);
            assert!(now >= last);
            last = now;
        }
    }
}
