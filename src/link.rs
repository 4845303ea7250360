//! The canonical wikilink grammar and its rewriting operations.
//!
//! Every other module resolves and rewrites link text through this module;
//! no other component owns a regex over link syntax. The grammar is
//! deliberately narrow: wikilinks (`[[target]]`, `[[target|alias]]`,
//! `[[target#anchor]]`), embeds (same shapes prefixed with `!`), end-of-line
//! block anchors, and a leading YAML frontmatter delimiter block. Nothing
//! else in a document is interpreted.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::QualiError;

static WIKILINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(!?)\[\[([^\[\]|#]+)(?:#([^\[\]|]*))?(?:\|([^\[\]]*))?\]\]")
        .expect("wikilink grammar regex is valid")
});

static FRONTMATTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\A---\r?\n(.*?)\r?\n---(?:\r?\n|\z)")
        .expect("frontmatter grammar regex is valid")
});

/// One recognized wikilink or embed occurrence, with byte offsets into the
/// text it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wikilink {
    /// Full matched text, brackets and `!` prefix included.
    pub raw: String,
    /// The target portion, untouched (may be a basename or a vault path).
    pub target: String,
    /// Content after `#`, if any. Block references keep their `^` prefix.
    pub anchor: Option<String>,
    pub alias: Option<String>,
    pub embed: bool,
    pub start: usize,
    pub end: usize,
}

impl Wikilink {
    /// Renders a wikilink from parts. `anchor` is expected to carry its `^`
    /// prefix for block references.
    pub fn render(embed: bool, target: &str, anchor: Option<&str>, alias: Option<&str>) -> String {
        let bang = if embed { "!" } else { "" };
        let anchor = anchor.map(|a| format!("#{a}")).unwrap_or_default();
        let alias = alias.map(|a| format!("|{a}")).unwrap_or_default();
        format!("{bang}[[{target}{anchor}{alias}]]")
    }
}

/// All wikilinks and embeds in `text`, in source order.
pub fn parse_wikilinks(text: &str) -> Vec<Wikilink> {
    WIKILINK
        .captures_iter(text)
        .map(|caps| {
            let full = caps.get(0).expect("capture group 0 always present");
            Wikilink {
                raw: full.as_str().to_string(),
                target: caps[2].trim().to_string(),
                anchor: caps.get(3).map(|m| m.as_str().trim().to_string()),
                alias: caps.get(4).map(|m| m.as_str().trim().to_string()),
                embed: !caps[1].is_empty(),
                start: full.start(),
                end: full.end(),
            }
        })
        .collect()
}

/// Byte range of the YAML between the leading `---` delimiters, if the
/// document opens with a frontmatter block.
pub fn frontmatter_region(content: &str) -> Option<Range<usize>> {
    FRONTMATTER
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.start()..m.end())
}

/// Byte offset just past the closing `---` delimiter line of a leading
/// frontmatter block, i.e. where the body starts.
pub fn frontmatter_block_end(content: &str) -> Option<usize> {
    FRONTMATTER.find(content).map(|m| m.end())
}

/// Appends ` [[target_label]] anchor` to a line that carries no anchor.
///
/// The anchor must be the final token on the line since the block-anchor
/// grammar is end-anchored.
pub fn insert_link(line_without_anchor: &str, target_label: &str, anchor: &str) -> String {
    let base = line_without_anchor.trim_end();
    if base.is_empty() {
        format!("[[{target_label}]] {anchor}")
    } else {
        format!("{base} [[{target_label}]] {anchor}")
    }
}

/// Strips the exact `wikilink_raw` substring from `line`, collapsing the
/// double space the removal leaves behind.
///
/// Whether the trailing block anchor should also go is the caller's call
/// (it depends on how many special-file links remain on the line), so this
/// function never touches the anchor.
pub fn remove_link(line: &str, wikilink_raw: &str) -> Result<String, QualiError> {
    let start = line.find(wikilink_raw).ok_or_else(|| {
        QualiError::NotFound(format!("wikilink '{wikilink_raw}' not present on line"))
    })?;
    let end = start + wikilink_raw.len();
    let mut out = String::with_capacity(line.len());
    out.push_str(&line[..start]);
    let rest = &line[end..];
    if out.is_empty() {
        out.push_str(rest.trim_start());
    } else if out.ends_with(' ') && rest.starts_with(' ') {
        out.push_str(&rest[1..]);
    } else {
        out.push_str(rest);
    }
    Ok(out.trim_end().to_string())
}

/// One pending replacement inside a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEdit {
    pub span: Range<usize>,
    pub replacement: String,
}

/// Applies edits in descending offset order so earlier replacements do not
/// invalidate the spans of later ones.
pub fn apply_edits(content: &str, mut edits: Vec<LinkEdit>) -> String {
    edits.sort_by(|a, b| b.span.start.cmp(&a.span.start));
    let mut out = content.to_string();
    for edit in edits {
        out.replace_range(edit.span, &edit.replacement);
    }
    out
}

/// Replaces every wikilink in `content` for which `matches` returns true
/// with the text produced by `replacement`. Returns the rewritten content
/// and the number of links replaced.
pub fn rewrite_links<M, R>(content: &str, matches: M, replacement: R) -> (String, usize)
where
    M: Fn(&Wikilink) -> bool,
    R: Fn(&Wikilink) -> String,
{
    let edits: Vec<LinkEdit> = parse_wikilinks(content)
        .iter()
        .filter(|link| matches(link))
        .map(|link| LinkEdit {
            span: link.start..link.end,
            replacement: replacement(link),
        })
        .collect();
    let count = edits.len();
    (apply_edits(content, edits), count)
}
