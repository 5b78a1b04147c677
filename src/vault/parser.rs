//! Markdown structure parser.
//!
//! Turns raw note text into a [`NoteCache`]: frontmatter tags, headings,
//! list items with their parent lines, block sections, and every link,
//! embed and inline tag with its span. Fenced code blocks are opaque and
//! inline code spans are masked before links and tags are matched.

use regex::Regex;
use std::sync::LazyLock;

use super::models::{
    normalize_tag, HeadingRef, LinkRef, ListItemRef, NoteCache, Position, SectionKind,
    SectionRef, Span, TagRef,
};

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))?[ \t]*$").expect("valid regex"));
static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([ \t]*)(?:[-*+]|\d{1,9}[.)])(?:[ \t]+|$)").expect("valid regex"));
static WIKILINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[\[([^\[\]]+?)\]\]").expect("valid regex"));
static MD_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\[\]]*)\]\(<?([^()\s<>]+)>?(?:\s+"[^"]*")?\)"#).expect("valid regex")
});
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\s)(#[\p{L}\p{N}_/\-]+)").expect("valid regex"));

/// Split text into lines, dropping a trailing `\r` from each.
///
/// Positions in a [`NoteCache`] refer to these lines.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect()
}

/// Parse a note's text into its structural cache.
pub fn parse_note(text: &str) -> NoteCache {
    let lines = split_lines(text);
    let mut cache = NoteCache::default();

    let body_start = parse_frontmatter(&lines, &mut cache);
    let mut blocks = BlockState::default();

    for (line_no, &line) in lines.iter().enumerate().skip(body_start) {
        let len = line.chars().count();
        let trimmed = line.trim_start();
        let indent = indent_width(line);

        // --- fenced code ---
        if let Some(fence) = blocks.fence {
            blocks.extend_or_open(SectionKind::Code, line_no, len);
            if trimmed.starts_with(fence) {
                blocks.fence = None;
                blocks.flush(&mut cache);
            }
            continue;
        }
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            if blocks.list_stack.last().is_none_or(|top| indent <= top.indent) {
                blocks.close_list();
            }
            blocks.flush(&mut cache);
            blocks.fence = Some(if trimmed.starts_with("```") { "```" } else { "~~~" });
            blocks.extend_or_open(SectionKind::Code, line_no, len);
            continue;
        }

        // --- blank ---
        if trimmed.is_empty() {
            blocks.flush(&mut cache);
            continue;
        }

        // --- heading ---
        if let Some(caps) = HEADING_RE.captures(line) {
            blocks.close_list();
            blocks.flush(&mut cache);
            let level = caps.get(1).map_or(1, |m| m.as_str().len()) as u8;
            let heading = caps
                .get(2)
                .map(|m| m.as_str().trim_end_matches('#').trim_end().to_string())
                .unwrap_or_default();
            let span = Span::lines(line_no, line_no, len);
            cache.headings.push(HeadingRef {
                heading,
                level,
                span,
            });
            cache.sections.push(SectionRef {
                kind: SectionKind::Heading,
                span,
            });
            scan_inline(line, line_no, &mut cache);
            continue;
        }

        // --- list item ---
        if LIST_ITEM_RE.is_match(line) {
            blocks.push_list_item(indent, line_no, len, &mut cache);
            if blocks.current_kind() != Some(SectionKind::List) {
                blocks.flush(&mut cache);
            }
            blocks.extend_or_open(SectionKind::List, line_no, len);
            scan_inline(line, line_no, &mut cache);
            continue;
        }

        // --- continuation of an open list ---
        if let Some(top) = blocks.list_stack.last() {
            if indent > top.indent {
                blocks.extend_list(indent, line_no, len, &mut cache);
                blocks.extend_or_open(SectionKind::List, line_no, len);
                scan_inline(line, line_no, &mut cache);
                continue;
            }
            blocks.close_list();
        }

        let kind = if trimmed.starts_with('>') {
            SectionKind::Blockquote
        } else {
            SectionKind::Paragraph
        };
        if blocks.current_kind() != Some(kind) {
            blocks.flush(&mut cache);
        }
        blocks.extend_or_open(kind, line_no, len);
        scan_inline(line, line_no, &mut cache);
    }
    blocks.flush(&mut cache);
    cache
        .sections
        .sort_by_key(|s| (s.span.start.line, s.span.end.line));
    cache
}

/// Parse leading YAML frontmatter. Returns the first body line.
fn parse_frontmatter(lines: &[&str], cache: &mut NoteCache) -> usize {
    if lines.first().map(|l| l.trim_end()) != Some("---") {
        return 0;
    }
    let Some(close) = lines
        .iter()
        .skip(1)
        .position(|l| matches!(l.trim_end(), "---" | "..."))
        .map(|p| p + 1)
    else {
        return 0;
    };

    let yaml = lines[1..close].join("\n");
    match serde_yaml::from_str::<serde_yaml::Value>(&yaml) {
        Ok(value) => {
            for key in ["tags", "tag"] {
                if let Some(v) = value.get(key) {
                    cache.frontmatter_tags.extend(yaml_tags(v));
                }
            }
        }
        Err(e) => tracing::debug!("Ignoring unparsable frontmatter: {}", e),
    }
    cache.sections.push(SectionRef {
        kind: SectionKind::Frontmatter,
        span: Span::lines(0, close, lines[close].chars().count()),
    });
    close + 1
}

fn yaml_tags(value: &serde_yaml::Value) -> Vec<String> {
    let raw: Vec<String> = match value {
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .filter_map(|v| match v {
                serde_yaml::Value::String(s) => Some(s.clone()),
                serde_yaml::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        serde_yaml::Value::String(s) => s
            .split(|c: char| c == ',' || c.is_whitespace())
            .map(str::to_string)
            .collect(),
        _ => vec![],
    };
    raw.into_iter()
        .filter(|t| !t.trim().trim_start_matches('#').is_empty())
        .map(|t| normalize_tag(&t))
        .collect()
}

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

// ============================================================================
// Block state
// ============================================================================

struct OpenItem {
    indent: usize,
    /// Index into `NoteCache::list_items`
    item: usize,
}

#[derive(Default)]
struct BlockState {
    fence: Option<&'static str>,
    /// (kind, first line, last line, last line length)
    section: Option<(SectionKind, usize, usize, usize)>,
    list_stack: Vec<OpenItem>,
    list_first_line: Option<usize>,
}

impl BlockState {
    fn current_kind(&self) -> Option<SectionKind> {
        self.section.map(|s| s.0)
    }

    fn extend_or_open(&mut self, kind: SectionKind, line: usize, len: usize) {
        match &mut self.section {
            Some((k, _, last, last_len)) if *k == kind => {
                *last = line;
                *last_len = len;
            }
            _ => self.section = Some((kind, line, line, len)),
        }
    }

    fn flush(&mut self, cache: &mut NoteCache) {
        if let Some((kind, first, last, last_len)) = self.section.take() {
            cache.sections.push(SectionRef {
                kind,
                span: Span::lines(first, last, last_len),
            });
        }
    }

    fn close_list(&mut self) {
        self.list_stack.clear();
        self.list_first_line = None;
    }

    fn push_list_item(&mut self, indent: usize, line: usize, len: usize, cache: &mut NoteCache) {
        let first = *self.list_first_line.get_or_insert(line);
        while self.list_stack.last().is_some_and(|top| top.indent >= indent) {
            self.list_stack.pop();
        }
        let parent = match self.list_stack.last() {
            Some(top) => cache.list_items[top.item].span.start.line as i64,
            None => -(first as i64),
        };
        cache.list_items.push(ListItemRef {
            parent,
            span: Span::lines(line, line, len),
        });
        self.list_stack.push(OpenItem {
            indent,
            item: cache.list_items.len() - 1,
        });
        self.stretch_open_items(line, len, cache);
    }

    /// A more-indented non-item line continues every item it is nested in.
    fn extend_list(&mut self, indent: usize, line: usize, len: usize, cache: &mut NoteCache) {
        while self.list_stack.len() > 1 && self.list_stack.last().is_some_and(|t| t.indent >= indent) {
            self.list_stack.pop();
        }
        self.stretch_open_items(line, len, cache);
    }

    fn stretch_open_items(&self, line: usize, len: usize, cache: &mut NoteCache) {
        for open in &self.list_stack {
            cache.list_items[open.item].span.end = Position::new(line, len);
        }
    }
}

// ============================================================================
// Inline scanning
// ============================================================================

/// Collect links, embeds and tags on one line.
fn scan_inline(line: &str, line_no: usize, cache: &mut NoteCache) {
    let masked = mask_inline_code(line);
    let mut taken: Vec<(usize, usize)> = Vec::new();

    for caps in WIKILINK_RE.captures_iter(&masked) {
        let Some(whole) = caps.get(0) else { continue };
        let embed = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let inner = caps.get(2).map_or("", |m| m.as_str());
        let (target, alias) = match inner.split_once('|') {
            Some((t, a)) => (t.trim(), Some(a.trim())),
            None => (inner.trim(), None),
        };
        if target.is_empty() {
            continue;
        }
        let span = byte_span(line, line_no, whole.start(), whole.end());
        taken.push((whole.start(), whole.end()));
        push_link(
            cache,
            LinkRef {
                link: target.to_string(),
                display: alias.unwrap_or(target).to_string(),
                span,
                embed,
            },
        );
    }

    for caps in MD_LINK_RE.captures_iter(&masked) {
        let Some(whole) = caps.get(0) else { continue };
        if overlaps(&taken, whole.start(), whole.end()) {
            continue;
        }
        let target = caps.get(3).map_or("", |m| m.as_str());
        if target.starts_with('#') || target.contains("://") || target.starts_with("mailto:") {
            continue;
        }
        let embed = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
        let text = caps.get(2).map_or("", |m| m.as_str());
        let span = byte_span(line, line_no, whole.start(), whole.end());
        taken.push((whole.start(), whole.end()));
        let target = target.replace("%20", " ");
        push_link(
            cache,
            LinkRef {
                display: if text.is_empty() {
                    target.clone()
                } else {
                    text.to_string()
                },
                link: target,
                span,
                embed,
            },
        );
    }

    for caps in TAG_RE.captures_iter(&masked) {
        let Some(tag) = caps.get(1) else { continue };
        if overlaps(&taken, tag.start(), tag.end()) {
            continue;
        }
        let body = &tag.as_str()[1..];
        if body.chars().all(|c| c.is_ascii_digit() || c == '/' || c == '-' || c == '_') {
            continue;
        }
        cache.tags.push(TagRef {
            tag: tag.as_str().to_string(),
            span: byte_span(line, line_no, tag.start(), tag.end()),
        });
    }
}

fn push_link(cache: &mut NoteCache, link: LinkRef) {
    if link.embed {
        cache.embeds.push(link);
    } else {
        cache.links.push(link);
    }
}

fn overlaps(taken: &[(usize, usize)], start: usize, end: usize) -> bool {
    taken.iter().any(|&(s, e)| start < e && s < end)
}

/// Convert byte offsets on `line` into a char-column span.
fn byte_span(line: &str, line_no: usize, start: usize, end: usize) -> Span {
    let start_col = line[..start].chars().count();
    let end_col = start_col + line[start..end].chars().count();
    Span::new(Position::new(line_no, start_col), Position::new(line_no, end_col))
}

/// Replace inline code spans with spaces, keeping byte offsets stable.
fn mask_inline_code(line: &str) -> String {
    if !line.contains('`') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len());
    let mut in_code = false;
    for c in line.chars() {
        if c == '`' {
            in_code = !in_code;
            out.push(c);
        } else if in_code {
            // Same byte length so regex offsets still index `line`
            for _ in 0..c.len_utf8() {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOTE: &str = "---
tags: [project, \"#area/work\"]
---
# Title

Intro mentions [[Alpha]] and [[Beta|the beta]]. Second #idea here.
Still the same paragraph with ![[diagram.png]].

## Section
- top [[Gamma]]
  - child [[Delta]]
    - grandchild #deep
- sibling [text](Epsilon.md)

```
[[NotALink]] #nottag
```
Inline `[[Hidden]]` code and [[Zeta#Part]].
";

    #[test]
    fn test_frontmatter_tags() {
        let cache = parse_note(NOTE);
        assert_eq!(cache.frontmatter_tags, vec!["#project", "#area/work"]);
        assert_eq!(cache.sections[0].kind, SectionKind::Frontmatter);
        assert_eq!(cache.sections[0].span.end.line, 2);
    }

    #[test]
    fn test_headings() {
        let cache = parse_note(NOTE);
        let headings: Vec<(&str, u8, usize)> = cache
            .headings
            .iter()
            .map(|h| (h.heading.as_str(), h.level, h.span.start.line))
            .collect();
        assert_eq!(headings, vec![("Title", 1, 3), ("Section", 2, 8)]);
    }

    #[test]
    fn test_links_and_embeds_with_columns() {
        let cache = parse_note(NOTE);
        let links: Vec<&str> = cache.links.iter().map(|l| l.link.as_str()).collect();
        assert_eq!(
            links,
            vec!["Alpha", "Beta", "Gamma", "Delta", "Epsilon.md", "Zeta#Part"]
        );
        let alpha = &cache.links[0];
        assert_eq!(alpha.span.start, Position::new(5, 15));
        assert_eq!(alpha.span.end, Position::new(5, 24));
        assert_eq!(cache.links[1].display, "the beta");
        assert_eq!(cache.embeds.len(), 1);
        assert_eq!(cache.embeds[0].link, "diagram.png");
        assert!(cache.embeds[0].embed);
    }

    #[test]
    fn test_code_is_opaque() {
        let cache = parse_note(NOTE);
        assert!(cache.references().all(|l| l.link != "NotALink" && l.link != "Hidden"));
        assert!(cache.tags.iter().all(|t| t.tag != "#nottag"));
        assert!(cache
            .sections
            .iter()
            .any(|s| s.kind == SectionKind::Code && s.span.start.line == 14));
    }

    #[test]
    fn test_inline_tags() {
        let cache = parse_note(NOTE);
        let tags: Vec<&str> = cache.tags.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tags, vec!["#idea", "#deep"]);
        assert_eq!(cache.all_tags(), vec!["#project", "#area/work", "#idea", "#deep"]);
    }

    #[test]
    fn test_list_hierarchy() {
        let cache = parse_note(NOTE);
        let items: Vec<(usize, i64, usize)> = cache
            .list_items
            .iter()
            .map(|li| (li.span.start.line, li.parent, li.span.end.line))
            .collect();
        // Roots point at the negated first list line; children at their parent's line
        assert_eq!(
            items,
            vec![(9, -9, 11), (10, 9, 11), (11, 10, 11), (12, -9, 12)]
        );
    }

    #[test]
    fn test_paragraph_sections() {
        let cache = parse_note(NOTE);
        let para = cache
            .sections
            .iter()
            .find(|s| s.kind == SectionKind::Paragraph)
            .unwrap();
        assert_eq!((para.span.start.line, para.span.end.line), (5, 6));
        let list = cache
            .sections
            .iter()
            .find(|s| s.kind == SectionKind::List)
            .unwrap();
        assert_eq!((list.span.start.line, list.span.end.line), (9, 12));
    }

    #[test]
    fn test_numeric_hash_is_not_tag_and_urls_are_not_links() {
        let cache = parse_note("Issue #123 see [site](https://example.com) and #a1");
        assert_eq!(cache.tags.len(), 1);
        assert_eq!(cache.tags[0].tag, "#a1");
        assert!(cache.links.is_empty());
    }

    #[test]
    fn test_split_lines_strips_cr() {
        assert_eq!(split_lines("a\r\nb\n"), vec!["a", "b", ""]);
    }
}
