//! Per-document context shared by the co-citation rules.
//!
//! Built once per linking document: where the source note is cited (own
//! links), which sentences, list items and sections hold those citations,
//! the heading scopes of the document, and its score floor.

use crate::text::{find_sentence, slice_chars, split_sentences, SentenceMatch};
use crate::vault::{split_lines, ListItemRef, NoteCache, SectionRef, Span};

/// A link, embed or tag occurrence being scored against the own links.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Resolved path, raw link path, or `#tag`
    pub target: String,
    pub span: Span,
}

/// An occurrence of a link to the source note, with its sentence context.
#[derive(Debug, Clone)]
pub struct OwnLink {
    pub span: Span,
    /// Line the link ends on
    pub line: usize,
    /// Sentences of that line, whitespace preserved
    pub sentences: Vec<String>,
    /// Sentence holding the link
    pub found: SentenceMatch,
}

/// Line range governed by one heading: from the heading up to the next
/// heading of the same or a higher level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingScope {
    pub level: u8,
    pub start: usize,
    /// Exclusive; `usize::MAX` when the scope runs to the end of the note
    pub end: usize,
}

impl HeadingScope {
    fn contains(&self, line: usize) -> bool {
        line >= self.start && line < self.end
    }
}

pub struct DocumentContext<'a> {
    /// Path of the linking document
    pub source: &'a str,
    pub lines: Vec<&'a str>,
    pub cache: &'a NoteCache,
    pub own_links: Vec<OwnLink>,
    /// Innermost list item around each own link, each once
    pub own_list_items: Vec<&'a ListItemRef>,
    /// Sections enclosing an own link
    pub own_sections: Vec<&'a SectionRef>,
    pub headings: Vec<HeadingScope>,
    pub min_score: f64,
}

impl<'a> DocumentContext<'a> {
    /// Gather context around `own_spans`. `None` when there are no own links.
    pub fn new(
        source: &'a str,
        text: &'a str,
        cache: &'a NoteCache,
        own_spans: &[Span],
    ) -> Option<Self> {
        if own_spans.is_empty() {
            return None;
        }
        let lines = split_lines(text);

        let own_links = own_spans
            .iter()
            .map(|span| {
                let line = span.end.line;
                let sentences = split_sentences(lines.get(line).copied().unwrap_or(""));
                let found = find_sentence(&sentences, span.end.col);
                OwnLink {
                    span: *span,
                    line,
                    sentences,
                    found,
                }
            })
            .collect();

        let mut own_list_items: Vec<&ListItemRef> = Vec::new();
        for span in own_spans {
            if let Some(item) = cache.list_item_enclosing(span) {
                if !own_list_items.iter().any(|known| known.span == item.span) {
                    own_list_items.push(item);
                }
            }
        }

        let own_sections = cache
            .sections
            .iter()
            .filter(|section| own_spans.iter().any(|span| section.span.encloses_lines(span)))
            .collect();

        Some(Self {
            source,
            lines,
            cache,
            own_links,
            own_list_items,
            own_sections,
            headings: heading_scopes(cache),
            min_score: min_score(cache),
        })
    }

    /// Text of `line`, empty past the end of the note.
    pub fn line(&self, line: usize) -> &str {
        self.lines.get(line).copied().unwrap_or("")
    }

    /// The line of `span` split into before / match / after.
    pub fn three_part(&self, span: &Span) -> Vec<String> {
        let line = self.line(span.start.line);
        let len = line.chars().count();
        vec![
            slice_chars(line, 0, span.start.col),
            slice_chars(line, span.start.col, span.end.col),
            slice_chars(line, span.end.col, len),
        ]
    }

    /// Heading scopes containing `line`, outermost first.
    pub fn heading_chain(&self, line: usize) -> Vec<&HeadingScope> {
        self.headings.iter().filter(|h| h.contains(line)).collect()
    }
}

/// Scope of every heading in document order.
fn heading_scopes(cache: &NoteCache) -> Vec<HeadingScope> {
    cache
        .headings
        .iter()
        .enumerate()
        .map(|(i, heading)| {
            let end = cache.headings[i + 1..]
                .iter()
                .find(|next| next.level <= heading.level)
                .map_or(usize::MAX, |next| next.span.start.line);
            HeadingScope {
                level: heading.level,
                start: heading.span.start.line,
                end,
            }
        })
        .collect()
}

/// Score floor for a document: `1 / 2^(4 + max_level - min_level)`.
///
/// Notes without headings count both levels as 1, giving `1/16`.
pub fn min_score(cache: &NoteCache) -> f64 {
    let levels = cache.headings.iter().map(|h| i32::from(h.level));
    let min = levels.clone().min().unwrap_or(1);
    let max = levels.max().unwrap_or(1);
    1.0 / 2f64.powi(4 + max - min)
}
