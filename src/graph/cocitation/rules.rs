//! Contextual scoring rules.
//!
//! Rules run in precedence order; the first one that produces evidence for
//! a candidate wins. A candidate no rule matches is scored at the
//! document's floor.
//!
//! | rule | condition | score |
//! |------|-----------|-------|
//! | same line | shares a line with an own link | 1.0 / 0.85 / 0.7 / 0.6 / 0.5 by sentence distance |
//! | list hierarchy | sibling or ancestor list item of an own link | 0.4 sibling, 0.6 / 0.5 / 0.4 by ancestor distance |
//! | paragraph | same paragraph as an own link | 0.45 |
//! | heading | same heading section as an own link | 0.3 / 0.2 / 0.1 by chain distance |
//! | fallback | none of the above | `1 / 2^(4 + max_level - min_level)` |

use crate::text::{find_sentence, slice_chars};
use crate::vault::{ListItemRef, SectionKind};

use super::context::{Candidate, DocumentContext};

/// One scored piece of evidence for a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored {
    pub measure: f64,
    pub sentence: Vec<String>,
    pub line: usize,
}

/// Returns no evidence when the rule does not apply.
pub type Rule = fn(&Candidate, &DocumentContext) -> Vec<Scored>;

/// Structural rules, strongest context first.
pub const RULES: &[(&str, Rule)] = &[
    ("same_line", same_line),
    ("list_hierarchy", list_hierarchy),
    ("paragraph", paragraph),
    ("heading", heading),
];

const SENTENCE_DISTANCE_SCORES: [f64; 4] = [1.0, 0.85, 0.7, 0.6];
const DISTANT_SENTENCE_SCORE: f64 = 0.5;

const SIBLING_SCORE: f64 = 0.4;
const ANCESTOR_SCORES: [f64; 3] = [0.6, 0.5, 0.4];

const PARAGRAPH_SCORE: f64 = 0.45;

const HEADING_SCORES: [f64; 3] = [0.3, 0.2, 0.1];

/// Score a candidate: the first matching rule, else the document floor.
pub fn score(candidate: &Candidate, ctx: &DocumentContext) -> Vec<Scored> {
    for (name, rule) in RULES {
        let evidence = rule(candidate, ctx);
        if !evidence.is_empty() {
            tracing::trace!(rule = *name, target = %candidate.target, "Co-citation rule matched");
            return evidence;
        }
    }
    vec![Scored {
        measure: ctx.min_score,
        sentence: ctx.three_part(&candidate.span),
        line: candidate.span.start.line,
    }]
}

/// Candidate on the same line as an own link, scored by sentence distance.
///
/// The evidence sentence has five parts: lead-in, first span, gap, second
/// span, tail, covering both sentences.
pub fn same_line(candidate: &Candidate, ctx: &DocumentContext) -> Vec<Scored> {
    let item = &candidate.span;
    ctx.own_links
        .iter()
        .filter(|own| own.line == item.start.line)
        .map(|own| {
            let found = find_sentence(&own.sentences, item.end.col);
            let line = ctx.line(own.line);
            let link = &own.span;

            let first_start = item.start.col.min(link.start.col);
            let first_end = item.end.col.min(link.end.col);
            let second_start = item.start.col.max(link.start.col);
            let second_end = item.end.col.max(link.end.col);
            let sentence = vec![
                slice_chars(line, found.start.min(own.found.start), first_start),
                slice_chars(line, first_start, first_end),
                slice_chars(line, first_end, second_start),
                slice_chars(line, second_start, second_end),
                slice_chars(line, second_end, found.end.max(own.found.end)),
            ];

            let distance = found.index.abs_diff(own.found.index) as usize;
            let measure = SENTENCE_DISTANCE_SCORES
                .get(distance)
                .copied()
                .unwrap_or(DISTANT_SENTENCE_SCORE);
            Scored {
                measure,
                sentence,
                line: own.line,
            }
        })
        .collect()
}

/// Candidate in a list item related to an own link's list item.
pub fn list_hierarchy(candidate: &Candidate, ctx: &DocumentContext) -> Vec<Scored> {
    let Some(item) = ctx.cache.list_item_enclosing(&candidate.span) else {
        return Vec::new();
    };

    ctx.own_list_items
        .iter()
        .filter_map(|own| {
            if are_siblings(ctx, own, item) {
                Some(SIBLING_SCORE)
            } else {
                ancestor_score(ctx, own, item).or_else(|| ancestor_score(ctx, item, own))
            }
        })
        .map(|measure| Scored {
            measure,
            sentence: ctx.three_part(&candidate.span),
            line: candidate.span.start.line,
        })
        .collect()
}

/// The list item `item` is nested in, if any.
///
/// A root of a list starting on line 0 also has parent `0`, so the
/// candidate parent must start above and enclose `item`.
fn parent_item<'a>(ctx: &DocumentContext<'a>, item: &ListItemRef) -> Option<&'a ListItemRef> {
    ctx.cache
        .list_item_at(item.parent)
        .filter(|p| p.span.start.line < item.span.start.line)
        .filter(|p| p.span.encloses_lines(&item.span))
}

fn are_siblings(ctx: &DocumentContext, a: &ListItemRef, b: &ListItemRef) -> bool {
    a.parent == b.parent
        && parent_item(ctx, a).map(|p| p.span) == parent_item(ctx, b).map(|p| p.span)
}

/// Score for `ancestor` sitting above `from`, walking at most three levels.
fn ancestor_score(ctx: &DocumentContext, from: &ListItemRef, ancestor: &ListItemRef) -> Option<f64> {
    let mut current = from;
    for score in ANCESTOR_SCORES {
        let parent = parent_item(ctx, current)?;
        if parent.span == ancestor.span {
            return Some(score);
        }
        current = parent;
    }
    None
}

/// Candidate on another line of a paragraph holding an own link.
pub fn paragraph(candidate: &Candidate, ctx: &DocumentContext) -> Vec<Scored> {
    let shared = ctx.own_sections.iter().any(|section| {
        section.kind == SectionKind::Paragraph && section.span.encloses_lines(&candidate.span)
    });
    if !shared {
        return Vec::new();
    }
    vec![Scored {
        measure: PARAGRAPH_SCORE,
        sentence: ctx.three_part(&candidate.span),
        line: candidate.span.start.line,
    }]
}

/// Candidate under a heading that also governs an own link.
///
/// The chain distance counts how far the deeper of the two sits below the
/// innermost heading they share; the closest own link wins.
pub fn heading(candidate: &Candidate, ctx: &DocumentContext) -> Vec<Scored> {
    let candidate_chain = ctx.heading_chain(candidate.span.start.line);
    if candidate_chain.is_empty() {
        return Vec::new();
    }

    let best = ctx
        .own_links
        .iter()
        .filter_map(|own| {
            let own_chain = ctx.heading_chain(own.span.start.line);
            let shared = own_chain
                .iter()
                .zip(candidate_chain.iter())
                .take_while(|(a, b)| a == b)
                .count();
            if shared == 0 {
                return None;
            }
            Some((own_chain.len() - shared).max(candidate_chain.len() - shared))
        })
        .min();

    match best {
        Some(distance) => vec![Scored {
            measure: HEADING_SCORES[distance.min(HEADING_SCORES.len() - 1)],
            sentence: ctx.three_part(&candidate.span),
            line: candidate.span.start.line,
        }],
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::{parse_note, NoteCache, Span};

    /// Score `target` in `text`, with every `[[a]]` as an own link.
    fn scored(text: &str, target: &str) -> Vec<Scored> {
        let cache: NoteCache = parse_note(text);
        let own: Vec<Span> = cache
            .references()
            .filter(|l| l.link == "a")
            .map(|l| l.span)
            .collect();
        let ctx = DocumentContext::new("doc.md", text, &cache, &own).unwrap();
        let span = cache
            .references()
            .find(|l| l.link == target)
            .map(|l| l.span)
            .or_else(|| cache.tags.iter().find(|t| t.tag == target).map(|t| t.span))
            .unwrap();
        score(
            &Candidate {
                target: target.to_string(),
                span,
            },
            &ctx,
        )
    }

    fn measures(evidence: &[Scored]) -> Vec<f64> {
        evidence.iter().map(|e| e.measure).collect()
    }

    #[test]
    fn test_same_sentence_scores_one() {
        let evidence = scored("See [[a]] and [[b]] together.", "b");
        assert_eq!(measures(&evidence), vec![1.0]);
        assert_eq!(
            evidence[0].sentence,
            vec!["See ", "[[a]]", " and ", "[[b]]", " together."]
        );
        assert_eq!(evidence[0].sentence.concat(), "See [[a]] and [[b]] together.");
    }

    #[test]
    fn test_sentence_distance_table() {
        let line = "[[a]] one. Two. Three [[b]]. Four. Five. Six [[c]].";
        assert_eq!(measures(&scored(line, "b")), vec![0.7]);
        assert_eq!(measures(&scored(line, "c")), vec![0.5]);
        assert_eq!(measures(&scored("[[a]] one. [[d]] two.", "d")), vec![0.85]);
    }

    #[test]
    fn test_one_evidence_per_own_link_on_line() {
        let evidence = scored("[[a]] and [[b]]. Again [[a]].", "b");
        assert_eq!(measures(&evidence), vec![1.0, 0.85]);
    }

    #[test]
    fn test_list_siblings() {
        let evidence = scored("- [[a]]\n- [[t]]", "t");
        assert_eq!(measures(&evidence), vec![0.4]);
        assert_eq!(evidence[0].sentence, vec!["- ", "[[t]]", ""]);
        assert_eq!(evidence[0].line, 1);
    }

    #[test]
    fn test_list_ancestors_by_distance() {
        let text = "- [[a]]\n  - [[c1]]\n    - [[c2]]\n      - [[c3]]\n        - [[c4]]";
        assert_eq!(measures(&scored(text, "c1")), vec![0.6]);
        assert_eq!(measures(&scored(text, "c2")), vec![0.5]);
        assert_eq!(measures(&scored(text, "c3")), vec![0.4]);
        // Deeper than three levels falls through to the floor
        assert_eq!(measures(&scored(text, "c4")), vec![1.0 / 16.0]);
    }

    #[test]
    fn test_list_descendant_own_link() {
        let text = "- [[p]]\n  - [[a]]";
        assert_eq!(measures(&scored(text, "p")), vec![0.6]);
    }

    #[test]
    fn test_paragraph_rule() {
        let evidence = scored("First [[a]] line\nsecond line [[p]]", "p");
        assert_eq!(measures(&evidence), vec![PARAGRAPH_SCORE]);
        assert_eq!(evidence[0].line, 1);
    }

    #[test]
    fn test_heading_rule_by_chain_distance() {
        let text = "# Top\n## A\n[[a]]\n\nlater [[s]]\n## B\ntext [[h]]\n# Other\n[[o]]";
        assert_eq!(measures(&scored(text, "s")), vec![0.3]);
        assert_eq!(measures(&scored(text, "h")), vec![0.2]);
        // No shared heading: floor for levels 1..2
        assert_eq!(measures(&scored(text, "o")), vec![1.0 / 32.0]);
    }

    #[test]
    fn test_fallback_uses_floor() {
        let evidence = scored("[[a]]\n\n[[f]]", "f");
        assert_eq!(measures(&evidence), vec![1.0 / 16.0]);
        assert_eq!(evidence[0].sentence, vec!["", "[[f]]", ""]);
    }

    #[test]
    fn test_tags_use_the_same_rules() {
        assert_eq!(measures(&scored("[[a]] is #topic", "#topic")), vec![1.0]);
    }
}
