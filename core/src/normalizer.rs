//! Geometry text normalization.
//!
//! The exporter writes a material-library line (`mtllib`) and an object-name
//! line (`o `) whose values depend on the exported instance rather than on the
//! geometry. Those lines are dropped; everything else is kept byte-for-byte so
//! that equality of the normalized text is equality of the geometry text.

use std::fs;
use std::hash::Hasher;
use std::path::Path;
use twox_hash::XxHash64;

/// 64-bit digest of normalized content, used as the grouping key.
pub type ContentDigest = u64;

/// Removes every line starting with one of `stripped_prefixes`.
///
/// Retained lines keep their original terminators, so a trailing line without
/// a newline stays without one.
pub fn normalize(content: &str, stripped_prefixes: &[String]) -> String {
    content
        .split_inclusive('\n')
        .filter(|line| !is_identifying_line(line, stripped_prefixes))
        .collect()
}

/// Reads the file at `path` and normalizes it.
pub fn normalize_file(path: &Path, stripped_prefixes: &[String]) -> std::io::Result<String> {
    let content = fs::read_to_string(path)?;
    Ok(normalize(&content, stripped_prefixes))
}

pub fn content_digest(normalized: &str) -> ContentDigest {
    let mut hasher = XxHash64::default();
    hasher.write(normalized.as_bytes());
    hasher.finish()
}

fn is_identifying_line(line: &str, stripped_prefixes: &[String]) -> bool {
    stripped_prefixes
        .iter()
        .any(|prefix| line.starts_with(prefix.as_str()))
}
