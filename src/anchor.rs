//! Block identity: stable per-paragraph anchor tokens.
//!
//! An anchor is a `^token` suffix on the final physical line of a paragraph.
//! Once assigned it is never reused for a different paragraph while
//! references to it exist, so generation is random rather than counter
//! based: two paragraphs anchored concurrently, or a counter going stale
//! after manual edits, must not collide.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static ANCHOR_AT_EOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\^[\w-]+$").expect("anchor grammar regex is valid"));

static ANCHOR_ANY_EOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(\^[\w-]+)[ \t]*$").expect("anchor grammar regex is valid"));

/// Splits a line into its content and trailing block anchor, if one is
/// present. The returned content is right-trimmed.
pub fn split_block_anchor(line: &str) -> (String, Option<String>) {
    let trimmed = line.trim_end();
    match ANCHOR_AT_EOL.find(trimmed) {
        Some(found) => (
            trimmed[..found.start()].trim_end().to_string(),
            Some(found.as_str().to_string()),
        ),
        None => (trimmed.to_string(), None),
    }
}

/// Every anchor token appearing at the end of any line of `content`.
pub fn collect_anchors(content: &str) -> BTreeSet<String> {
    ANCHOR_ANY_EOL
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}

fn random_anchor() -> String {
    // Six decimal digits out of v4 UUID bytes.
    let digits: String = Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(6)
        .map(|b| char::from(b'0' + (b % 10)))
        .collect();
    format!("^id-{digits}")
}

/// Returns the anchor for `line_text` along with the line minus its anchor.
///
/// If the line already ends with an anchor it is returned verbatim.
/// Otherwise a fresh anchor is generated, collision-checked against every
/// anchor already present in `content` (the full file the line belongs to).
pub fn ensure_block_anchor(content: &str, line_text: &str) -> (String, String) {
    let (without_anchor, existing) = split_block_anchor(line_text);
    if let Some(anchor) = existing {
        return (anchor, without_anchor);
    }
    let taken = collect_anchors(content);
    let anchor = loop {
        let candidate = random_anchor();
        if !taken.contains(&candidate) {
            break candidate;
        }
        tracing::debug!("Anchor collision on {candidate}, regenerating");
    };
    (anchor, without_anchor)
}
