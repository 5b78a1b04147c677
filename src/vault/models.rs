//! Structural cache types.
//!
//! Per-note metadata the engine consumes: link/embed/tag occurrences with
//! their spans, headings, list items, and block sections. All positions are
//! 0-based; columns count `char`s.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source note → destination → occurrence count.
pub type LinkAdjacency = HashMap<String, HashMap<String, usize>>;

/// Markdown file extension used for notes and synthesised unresolved targets.
pub const MD_EXTENSION: &str = "md";

/// A point inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Half-open range `[start, end)` in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Span covering whole lines `first..=last`.
    pub fn lines(first: usize, last: usize, last_col: usize) -> Self {
        Self {
            start: Position::new(first, 0),
            end: Position::new(last, last_col),
        }
    }

    /// Whether `other` lies within this span's line range.
    pub fn encloses_lines(&self, other: &Span) -> bool {
        other.start.line >= self.start.line && other.end.line <= self.end.line
    }

    /// Whether `line` is within this span's line range.
    pub fn contains_line(&self, line: usize) -> bool {
        line >= self.start.line && line <= self.end.line
    }
}

/// A wikilink, markdown link, or embed occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRef {
    /// Link target as written, including any `#subpath`
    pub link: String,
    /// Display text (alias or the raw target)
    pub display: String,
    pub span: Span,
    /// `![[...]]` / `![](...)`
    pub embed: bool,
}

/// An inline `#tag` occurrence. `tag` keeps the leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub tag: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingRef {
    pub heading: String,
    pub level: u8,
    pub span: Span,
}

/// A list item.
///
/// `parent` is the line of the enclosing list item, or the negated first line
/// of the list for top-level items, so roots always have `parent <= 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItemRef {
    pub parent: i64,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    Frontmatter,
    Heading,
    Paragraph,
    List,
    Code,
    Blockquote,
}

/// A contiguous block of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRef {
    pub kind: SectionKind,
    pub span: Span,
}

/// Everything the engine knows about one note's structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoteCache {
    pub links: Vec<LinkRef>,
    pub embeds: Vec<LinkRef>,
    pub tags: Vec<TagRef>,
    pub headings: Vec<HeadingRef>,
    pub list_items: Vec<ListItemRef>,
    pub sections: Vec<SectionRef>,
    /// Tags declared in YAML frontmatter, normalised to `#tag`
    pub frontmatter_tags: Vec<String>,
}

impl NoteCache {
    /// Links followed by embeds.
    pub fn references(&self) -> impl Iterator<Item = &LinkRef> {
        self.links.iter().chain(self.embeds.iter())
    }

    /// Frontmatter tags followed by inline tags, each once.
    pub fn all_tags(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for tag in self
            .frontmatter_tags
            .iter()
            .chain(self.tags.iter().map(|t| &t.tag))
        {
            if !out.contains(tag) {
                out.push(tag.clone());
            }
        }
        out
    }

    /// The innermost list item whose line range encloses `span`.
    pub fn list_item_enclosing(&self, span: &Span) -> Option<&ListItemRef> {
        self.list_items
            .iter()
            .filter(|li| li.span.encloses_lines(span))
            .max_by_key(|li| li.span.start.line)
    }

    /// The list item starting on `line`.
    pub fn list_item_at(&self, line: i64) -> Option<&ListItemRef> {
        if line < 0 {
            return None;
        }
        self.list_items
            .iter()
            .find(|li| li.span.start.line as i64 == line)
    }
}

/// Normalise a tag to its `#`-prefixed form.
pub fn normalize_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    if trimmed.starts_with('#') {
        trimmed.to_string()
    } else {
        format!("#{}", trimmed)
    }
}

/// Extension of a path (text after the last `.` of the final component).
pub fn extension_of(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// Whether `path` is a markdown note.
pub fn is_markdown(path: &str) -> bool {
    extension_of(path).is_some_and(|ext| ext.eq_ignore_ascii_case(MD_EXTENSION))
}
