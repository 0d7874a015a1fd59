//! Stable content hashing for chunk IDs.

use sha2::{Digest, Sha256};

/// Stable 16-hex-digit ID for a chunk of `path` spanning `start_line..=end_line`.
pub fn stable_hash(content: &str, path: &str, start_line: usize, end_line: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update(b":");
    hasher.update(start_line.to_string().as_bytes());
    hasher.update(b"-");
    hasher.update(end_line.to_string().as_bytes());
    hasher.update(b"\n");
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::stable_hash;

    #[test]
    fn same_input_same_id() {
        let a = stable_hash("fn main() {}", "src/main.rs", 1, 1);
        let b = stable_hash("fn main() {}", "src/main.rs", 1, 1);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn span_changes_id() {
        let a = stable_hash("x", "a.txt", 1, 1);
        let b = stable_hash("x", "a.txt", 2, 2);
        assert_ne!(a, b);
    }
}
