//! Editor line buffer and paragraph scope finding.
//!
//! [LineBuffer] is the engine's view of an open editor: a line-indexed text
//! buffer with a cursor and selections. Host applications adapt their real
//! editor onto it; the engine also builds one from file content when a
//! command runs without an open editor.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::QualiError;

static LIST_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s").expect("list item regex is valid"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorPos {
    pub line: usize,
    pub ch: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: CursorPos,
    pub head: CursorPos,
}

impl Selection {
    pub fn is_caret(&self) -> bool {
        self.anchor == self.head
    }

    pub fn spans_multiple_lines(&self) -> bool {
        self.anchor.line != self.head.line
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    lines: Vec<String>,
    trailing_newline: bool,
    cursor: CursorPos,
    selections: Vec<Selection>,
}

impl LineBuffer {
    pub fn from_text(text: &str) -> Self {
        LineBuffer {
            lines: text.lines().map(str::to_string).collect(),
            trailing_newline: text.ends_with('\n') || text.is_empty(),
            ..Default::default()
        }
    }

    pub fn text(&self) -> String {
        let mut out = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            out.push('\n');
        }
        out
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn get_line(&self, n: usize) -> Option<&str> {
        self.lines.get(n).map(String::as_str)
    }

    pub fn set_line(&mut self, n: usize, text: String) -> Result<(), QualiError> {
        let slot = self
            .lines
            .get_mut(n)
            .ok_or_else(|| QualiError::NotFound(format!("line {n} out of range")))?;
        *slot = text;
        Ok(())
    }

    pub fn remove_line(&mut self, n: usize) -> Result<String, QualiError> {
        if n >= self.lines.len() {
            return Err(QualiError::NotFound(format!("line {n} out of range")));
        }
        Ok(self.lines.remove(n))
    }

    pub fn cursor(&self) -> CursorPos {
        self.cursor
    }

    pub fn set_cursor(&mut self, pos: CursorPos) {
        self.cursor = pos;
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn set_selections(&mut self, selections: Vec<Selection>) {
        self.selections = selections;
    }

    fn is_blank(&self, n: usize) -> bool {
        self.lines
            .get(n)
            .map(|l| l.trim().is_empty())
            .unwrap_or(true)
    }
}

/// Inclusive line range of the paragraph around the cursor, expanding
/// outward while adjacent lines are non-blank.
///
/// Fails with [QualiError::AmbiguousScope] when the cursor sits on a blank
/// line or when the buffer carries a multi-line or multiple selection, since
/// "the" paragraph cannot be resolved unambiguously then.
pub fn paragraph_range(buffer: &LineBuffer) -> Result<(usize, usize), QualiError> {
    let selections = buffer.selections();
    if selections.len() > 1 {
        return Err(QualiError::AmbiguousScope(
            "multiple selections active".to_string(),
        ));
    }
    if let Some(sel) = selections.first() {
        if !sel.is_caret() && sel.spans_multiple_lines() {
            return Err(QualiError::AmbiguousScope(
                "selection spans multiple lines".to_string(),
            ));
        }
    }
    let line = buffer.cursor().line;
    if line >= buffer.line_count() || buffer.is_blank(line) {
        return Err(QualiError::AmbiguousScope(
            "current line is empty".to_string(),
        ));
    }
    let mut start = line;
    while start > 0 && !buffer.is_blank(start - 1) {
        start -= 1;
    }
    let mut end = line;
    while end + 1 < buffer.line_count() && !buffer.is_blank(end + 1) {
        end += 1;
    }
    Ok((start, end))
}

/// The final physical line of the paragraph containing `line`, additionally
/// stopping downward expansion at a list-item boundary.
///
/// Anchors are only valid on the last line of a soft-wrapped paragraph, and
/// a new list item starts a new anchor scope.
pub fn last_line_of_paragraph(buffer: &LineBuffer, line: usize) -> usize {
    let mut end = line;
    while end + 1 < buffer.line_count() && !buffer.is_blank(end + 1) {
        let next = buffer.get_line(end + 1).unwrap_or_default();
        if LIST_ITEM.is_match(next) {
            break;
        }
        end += 1;
    }
    end
}
