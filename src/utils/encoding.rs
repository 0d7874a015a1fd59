//! Text/binary sniffing and encoding-aware file reads.

use crate::domain::FileClass;
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Bytes inspected when classifying a file.
pub const SNIFF_BYTES: usize = 8 * 1024;

/// Minimum share of printable characters for a legacy-encoded sample to count as text.
const PRINTABLE_RATIO: f64 = 0.8;

/// Classify a file by its leading bytes. I/O failures become
/// [`FileClass::Unreadable`] rather than errors.
pub fn classify_file(path: &Path) -> FileClass {
    match read_prefix(path, SNIFF_BYTES) {
        Ok(prefix) => classify_bytes(&prefix, prefix.len() == SNIFF_BYTES),
        Err(err) => {
            tracing::debug!(path = %path.display(), error = %err, "cannot sniff file");
            FileClass::Unreadable(err.to_string())
        }
    }
}

/// Classify a byte sample. `truncated` says whether the sample is a prefix of
/// a longer file, so a multi-byte sequence cut at the end is tolerated.
pub fn classify_bytes(sample: &[u8], truncated: bool) -> FileClass {
    if sample.is_empty() {
        return FileClass::Text;
    }

    if let Some((encoding, bom_len)) = Encoding::for_bom(sample) {
        if encoding != UTF_8 {
            let (_, had_errors) =
                encoding.decode_without_bom_handling(&sample[bom_len..]);
            return if had_errors && !truncated { FileClass::Binary } else { FileClass::Text };
        }
    }

    if sample.contains(&0) {
        return FileClass::Binary;
    }

    match std::str::from_utf8(sample) {
        Ok(_) => return FileClass::Text,
        Err(err) if truncated && err.error_len().is_none() => return FileClass::Text,
        Err(_) => {}
    }

    let encoding = guess_encoding(sample);
    let Some(decoded) = encoding.decode_without_bom_handling_and_without_replacement(sample)
    else {
        return FileClass::Binary;
    };
    if printable_ratio(&decoded) >= PRINTABLE_RATIO {
        FileClass::Text
    } else {
        FileClass::Binary
    }
}

/// Read a whole file as text, honoring a BOM, preferring UTF-8 and falling back
/// to a detected legacy encoding. Returns the content and the encoding name.
pub fn read_file_safe(path: &Path) -> io::Result<(String, &'static str)> {
    let bytes = std::fs::read(path)?;

    if let Some((encoding, _)) = Encoding::for_bom(&bytes) {
        let (content, had_errors) = encoding.decode_with_bom_removal(&bytes);
        if had_errors {
            tracing::debug!(path = %path.display(), "replacement characters in BOM-marked file");
        }
        return Ok((content.into_owned(), encoding.name()));
    }

    match String::from_utf8(bytes) {
        Ok(content) => Ok((content, UTF_8.name())),
        Err(err) => {
            let bytes = err.into_bytes();
            let encoding = guess_encoding(&bytes);
            let (content, _, had_errors) = encoding.decode(&bytes);
            if had_errors {
                tracing::debug!(
                    path = %path.display(),
                    encoding = encoding.name(),
                    "replacement characters while decoding"
                );
            }
            Ok((content.into_owned(), encoding.name()))
        }
    }
}

fn read_prefix(path: &Path, limit: usize) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(limit);
    file.take(limit as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

fn guess_encoding(bytes: &[u8]) -> &'static Encoding {
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(None, true)
}

fn printable_ratio(text: &str) -> f64 {
    let mut total = 0usize;
    let mut printable = 0usize;
    for c in text.chars() {
        total += 1;
        if !c.is_control() || matches!(c, '\n' | '\r' | '\t') {
            printable += 1;
        }
    }
    if total == 0 {
        1.0
    } else {
        printable as f64 / total as f64
    }
}
