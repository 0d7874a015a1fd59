//! Context document rendering

use chrono::{DateTime, Local};

use crate::domain::{ContextBody, ContextEntry, FileClass};
use crate::utils::format_with_commas;

const RULE: &str = "================================================================";

/// Render the context document for `project`. Pass `None` for `generated_at`
/// to get reproducible output.
pub fn render_context_document(
    project: &str,
    entries: &[ContextEntry],
    generated_at: Option<DateTime<Local>>,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("# {project}\n"));
    if let Some(ts) = generated_at {
        out.push_str(&format!("Generated: {}\n", ts.to_rfc3339()));
    }
    out.push_str(&format!("Files: {}\n", entries.len()));

    for entry in entries {
        out.push('\n');
        render_entry(&mut out, entry);
    }
    out
}

fn render_entry(out: &mut String, entry: &ContextEntry) {
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!("File: {}\n", entry.relative_path));
    out.push_str(&format!("Type: {}\n", type_line(entry)));
    out.push_str(&format!("Size: {} bytes\n", format_with_commas(entry.size_bytes)));
    out.push_str(RULE);
    out.push('\n');

    match &entry.body {
        ContextBody::Verbatim(content) => push_block(out, content),
        ContextBody::Summary(summary) => {
            out.push_str(&format!(
                "Summary ({} of {} chunks summarized):\n",
                summary.summarized_chunks(),
                summary.total_chunks()
            ));
            push_block(out, &summary.assemble());
        }
        ContextBody::Truncated { head, omitted_chunks } => {
            push_block(out, head);
            out.push_str(&format!(
                "[... truncated: {omitted_chunks} more chunk(s) not shown ...]\n"
            ));
        }
        ContextBody::Omitted(reason) => out.push_str(&format!("({reason})\n")),
    }
}

fn type_line(entry: &ContextEntry) -> String {
    let detail = match (&entry.class, &entry.body) {
        (FileClass::Text, ContextBody::Verbatim(_)) => "full content",
        (FileClass::Text, ContextBody::Summary(_)) => "summarized",
        (FileClass::Text, ContextBody::Truncated { .. }) => "truncated",
        (FileClass::Text, ContextBody::Omitted(_)) => "omitted",
        (FileClass::Binary, _) => "path only",
        (FileClass::Unreadable(_), _) => "skipped",
    };
    format!("{} ({detail})", entry.class)
}

/// Append `text`, making sure it ends with a newline.
fn push_block(out: &mut String, text: &str) {
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChunkSummary, FileSummary};

    fn entry(path: &str, class: FileClass, size: u64, body: ContextBody) -> ContextEntry {
        ContextEntry { relative_path: path.to_string(), class, size_bytes: size, body }
    }

    #[test]
    fn renders_header_and_delimited_entries() {
        let entries = vec![
            entry("src/main.rs", FileClass::Text, 12, ContextBody::Verbatim("fn main() {}".into())),
            entry("logo.png", FileClass::Binary, 2048, ContextBody::Omitted("binary file".into())),
        ];
        let doc = render_context_document("demo", &entries, None);

        let expected = format!(
            "# demo\nFiles: 2\n\n\
             {RULE}\nFile: src/main.rs\nType: text (full content)\nSize: 12 bytes\n{RULE}\n\
             fn main() {{}}\n\n\
             {RULE}\nFile: logo.png\nType: binary (path only)\nSize: 2,048 bytes\n{RULE}\n\
             (binary file)\n"
        );
        similar_asserts::assert_eq!(doc, expected);
    }

    #[test]
    fn summary_body_lists_counts_and_placeholder() {
        let summary = FileSummary {
            parts: vec![
                ChunkSummary { chunk_id: "a".into(), index: 0, text: Some("first".into()) },
                ChunkSummary { chunk_id: "b".into(), index: 1, text: None },
            ],
        };
        let doc = render_context_document(
            "demo",
            &[entry("big.txt", FileClass::Text, 40_000, ContextBody::Summary(summary))],
            None,
        );
        assert!(doc.contains("Type: text (summarized)"));
        assert!(doc.contains(concat!(
            "Summary (1 of 2 chunks summarized):\n",
            "[part 1/2] first\n\n",
            "[summary unavailable for chunk 2/2]\n",
        )));
    }

    #[test]
    fn truncated_body_has_marker() {
        let doc = render_context_document(
            "demo",
            &[entry(
                "big.txt",
                FileClass::Text,
                40_000,
                ContextBody::Truncated { head: "head\n".into(), omitted_chunks: 3 },
            )],
            None,
        );
        assert!(doc.contains("head\n[... truncated: 3 more chunk(s) not shown ...]\n"));
    }

    #[test]
    fn timestamp_is_optional() {
        let with = render_context_document("demo", &[], Some(Local::now()));
        assert!(with.contains("Generated: "));
        let without = render_context_document("demo", &[], None);
        assert_eq!(without, "# demo\nFiles: 0\n");
    }
}
