// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bracket-block extraction and `key:[value]` pair parsing.

use crate::entities::decode_entities;
use crate::error::NotesCodecError;
use once_cell::sync::Lazy;
use regex::Regex;

static PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)] // static pattern, verified by test below
    Regex::new(r#"(\w+):\[(?:"([^"]*)"|([^\]]*))\]"#).unwrap()
});

/// The span and inner content of a located `{!tag ...}` block.
pub struct BlockMatch {
    /// Byte offset of the opening `{`.
    pub start: usize,
    /// Byte offset one past the closing `}`.
    pub end: usize,
    /// Content between `{!tag` and the closing `}`.
    pub inner: String,
}

/// Locates the `{!tag ...}` block for `tag` (e.g. `"traptrigger"`) within
/// `notes`, if present. Blocks are assumed not to contain a literal `}` in
/// their content, consistent with the `key:[value]` grammar.
#[must_use]
pub fn find_block(notes: &str, tag: &str) -> Option<BlockMatch> {
    let needle = format!("{{!{tag}");
    let start = notes.find(&needle)?;
    let rel_end = notes[start..].find('}')?;
    let end = start + rel_end + 1;
    let inner = notes[start + needle.len()..end - 1].to_string();
    Some(BlockMatch { start, end, inner })
}

/// Parses ordered `key:[value]` pairs out of a block's inner content.
///
/// Values may be bare or double-quoted; HTML entities are decoded. Order is
/// preserved so callers can round-trip unrecognized keys.
pub fn parse_pairs(inner: &str) -> Result<Vec<(String, String)>, NotesCodecError> {
    let mut pairs = Vec::new();
    for caps in PAIR_RE.captures_iter(inner) {
        let key = caps
            .get(1)
            .ok_or_else(|| NotesCodecError::MalformedEntry(inner.to_string()))?
            .as_str()
            .to_string();
        let raw_value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        pairs.push((key, decode_entities(raw_value.trim())));
    }
    if pairs.is_empty() && !inner.trim().is_empty() {
        return Err(NotesCodecError::MalformedEntry(inner.to_string()));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_block_and_extracts_inner() {
        let notes = "prefix {!traptrigger uses:[1/1] armed:[on]} suffix";
        let block = find_block(notes, "traptrigger").expect("block found");
        assert_eq!(block.inner.trim(), "uses:[1/1] armed:[on]");
        assert_eq!(&notes[block.start..block.end], "{!traptrigger uses:[1/1] armed:[on]}");
    }

    #[test]
    fn missing_block_is_none() {
        assert!(find_block("just some notes", "traptrigger").is_none());
    }

    #[test]
    fn parses_quoted_and_bare_values() {
        let pairs = parse_pairs(r##"primary:["#Explode"] armed:[on]"##).expect("parses");
        assert_eq!(pairs, vec![
            ("primary".to_string(), "#Explode".to_string()),
            ("armed".to_string(), "on".to_string()),
        ]);
    }

    #[test]
    fn decodes_entities_in_values() {
        let pairs = parse_pairs(r#"primary:[Safe &amp; sound]"#).expect("parses");
        assert_eq!(pairs[0].1, "Safe & sound");
    }
}
