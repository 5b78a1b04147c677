//! Text-structure utilities.
//!
//! Pure helpers shared by the co-citation scorer and the algorithm library:
//! - **Sentence segmentation**: whitespace-preserving split of a single line
//! - **Sentence lookup**: which sentence of a line contains a given column
//! - **Set/count helpers**: ordered intersection, label counting, arg-max
//! - **Rounding**: fixed-precision rounding of reported measures
//!
//! Columns are measured in `char`s, matching the positions produced by
//! [`crate::vault::parser`].

use std::collections::{BTreeMap, HashSet};

/// Decimal places kept in every reported measure.
pub const DECIMALS: u32 = 4;

/// Abbreviations that end with a period but do not end a sentence.
const ABBREVIATIONS: &[&str] = &[
    "e.g", "i.e", "etc", "vs", "cf", "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "fig",
    "no", "vol", "approx", "al",
];

// ============================================================================
// Sentences
// ============================================================================

/// Split a line into sentences, keeping every character.
///
/// Concatenating the returned sentences reproduces `line` exactly: the
/// whitespace following a terminator is attached to the sentence it ends.
/// Terminators inside `[[...]]` links are ignored, as are periods that close
/// a known abbreviation or sit between digits (`3.14`).
pub fn split_sentences(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut link_depth = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let c = chars[i];
        if c == '[' && chars.get(i + 1) == Some(&'[') {
            link_depth += 1;
            i += 2;
            continue;
        }
        if c == ']' && chars.get(i + 1) == Some(&']') && link_depth > 0 {
            link_depth -= 1;
            i += 2;
            continue;
        }

        if link_depth == 0 && matches!(c, '.' | '!' | '?' | '。' | '！' | '？') {
            // Swallow runs like "?!" or "..." and trailing closers
            let mut end = i + 1;
            while end < chars.len() && matches!(chars[end], '.' | '!' | '?') {
                end += 1;
            }
            while end < chars.len() && matches!(chars[end], '"' | '\'' | ')' | '”' | '’') {
                end += 1;
            }

            let cjk = matches!(c, '。' | '！' | '？');
            let at_boundary = end == chars.len() || chars[end].is_whitespace() || cjk;

            if at_boundary && !(c == '.' && is_false_period(&chars, start, i)) {
                while end < chars.len() && chars[end].is_whitespace() {
                    end += 1;
                }
                sentences.push(chars[start..end].iter().collect());
                start = end;
                i = end;
                continue;
            }
            i = end;
            continue;
        }
        i += 1;
    }

    if start < chars.len() {
        sentences.push(chars[start..].iter().collect());
    }
    sentences
}

/// A period that belongs to an abbreviation or a number rather than a sentence end.
fn is_false_period(chars: &[char], sentence_start: usize, dot: usize) -> bool {
    if dot > 0
        && chars[dot - 1].is_ascii_digit()
        && chars.get(dot + 1).is_some_and(|c| c.is_ascii_digit())
    {
        return true;
    }

    let mut word_start = dot;
    while word_start > sentence_start
        && !chars[word_start - 1].is_whitespace()
        && chars[word_start - 1] != '('
    {
        word_start -= 1;
    }
    let word: String = chars[word_start..dot].iter().collect::<String>().to_lowercase();
    if word.is_empty() {
        return false;
    }
    // Single initials ("J. Smith") and dotted acronyms ("U.S.")
    if word.chars().count() == 1 && word.chars().all(char::is_alphabetic) {
        return true;
    }
    ABBREVIATIONS.contains(&word.as_str())
}

/// Location of a span inside a segmented line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentenceMatch {
    /// Sentence number, or `-1` when the column lies past the last sentence
    pub index: i64,
    /// Column where the sentence starts
    pub start: usize,
    /// Column where the sentence ends (exclusive)
    pub end: usize,
}

/// Find the sentence holding `end_col`.
///
/// Sentence lengths are accumulated; the span belongs to the first sentence
/// whose cumulative length reaches or exceeds `end_col`. When none does the
/// result has `index == -1`, `start == 0` and `end` equal to the line length.
pub fn find_sentence<S: AsRef<str>>(sentences: &[S], end_col: usize) -> SentenceMatch {
    let mut aggregate = 0usize;
    for (count, sentence) in sentences.iter().enumerate() {
        let next = aggregate + sentence.as_ref().chars().count();
        if end_col <= next {
            return SentenceMatch {
                index: count as i64,
                start: aggregate,
                end: next,
            };
        }
        aggregate = next;
    }
    SentenceMatch {
        index: -1,
        start: 0,
        end: aggregate,
    }
}

/// Slice `line` by char columns. Out-of-range or inverted bounds yield `""`.
pub fn slice_chars(line: &str, start: usize, end: usize) -> String {
    if start >= end {
        return String::new();
    }
    line.chars().skip(start).take(end - start).collect()
}

// ============================================================================
// Collections
// ============================================================================

/// Elements of `a` that also occur in `b`, in `a`'s order.
pub fn intersection<T: AsRef<str>>(a: &[T], b: &[T]) -> Vec<String> {
    let lookup: HashSet<&str> = b.iter().map(AsRef::as_ref).collect();
    a.iter()
        .map(AsRef::as_ref)
        .filter(|x| lookup.contains(x))
        .map(str::to_string)
        .collect()
}

/// Occurrence count per distinct item.
pub fn counts<'a, I>(items: I) -> BTreeMap<&'a str, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = BTreeMap::new();
    for item in items {
        *out.entry(item).or_insert(0) += 1;
    }
    out
}

/// Key with the highest count; ties go to the lexicographically smallest key.
pub fn max_key<'a>(counts: &BTreeMap<&'a str, usize>) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    // BTreeMap iterates in key order, so strict `>` keeps the smallest key on ties
    for (&key, &count) in counts {
        match best {
            Some((_, c)) if count <= c => {}
            _ => best = Some((key, count)),
        }
    }
    best.map(|(k, _)| k)
}

// ============================================================================
// Numbers
// ============================================================================

/// Round to `dec` decimal places.
pub fn round_to(num: f64, dec: u32) -> f64 {
    let factor = 10f64.powi(dec as i32);
    (num * factor).round() / factor
}

/// Round to [`DECIMALS`] places.
pub fn round_number(num: f64) -> f64 {
    round_to(num, DECIMALS)
}

/// Replace NaN, infinities and values below machine epsilon with `0.0`.
pub fn finite_or_zero(num: f64) -> f64 {
    if !num.is_finite() || num.abs() < f64::EPSILON {
        0.0
    } else {
        num
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences_preserves_text() {
        let line = "First sentence. Second one!  Third? trailing";
        let sentences = split_sentences(line);
        assert_eq!(
            sentences,
            vec!["First sentence. ", "Second one!  ", "Third? ", "trailing"]
        );
        assert_eq!(sentences.concat(), line);
    }

    #[test]
    fn test_split_sentences_ignores_links_and_abbreviations() {
        let line = "See [[notes/v1.2. draft]] e.g. this one. Pi is 3.14 exactly.";
        let sentences = split_sentences(line);
        assert_eq!(sentences.len(), 2, "got {:?}", sentences);
        assert_eq!(sentences.concat(), line);
    }

    #[test]
    fn test_split_sentences_empty_line() {
        assert!(split_sentences("").is_empty());
    }

    #[test]
    fn test_find_sentence_cumulative() {
        let sentences = vec!["Alpha beta. ", "Gamma [[X]] delta."];
        // "Alpha beta. " is 12 chars
        assert_eq!(
            find_sentence(&sentences, 5),
            SentenceMatch {
                index: 0,
                start: 0,
                end: 12
            }
        );
        assert_eq!(find_sentence(&sentences, 12).index, 0);
        let m = find_sentence(&sentences, 13);
        assert_eq!((m.index, m.start, m.end), (1, 12, 30));
    }

    #[test]
    fn test_find_sentence_unmatched_is_minus_one() {
        let sentences = vec!["short."];
        let m = find_sentence(&sentences, 40);
        assert_eq!(m.index, -1);
        assert_eq!(m.start, 0);
        assert_eq!(m.end, 6);
    }

    #[test]
    fn test_slice_chars_multibyte_and_inverted() {
        assert_eq!(slice_chars("héllo wörld", 1, 5), "éllo");
        assert_eq!(slice_chars("abc", 2, 1), "");
        assert_eq!(slice_chars("abc", 1, 99), "bc");
    }

    #[test]
    fn test_intersection_keeps_left_order() {
        let a = vec!["c", "a", "b"];
        let b = vec!["b", "c", "z"];
        assert_eq!(intersection(&a, &b), vec!["c", "b"]);
    }

    #[test]
    fn test_max_key_tie_breaks_lexicographically() {
        let c = counts(["b", "a", "b", "a", "c"]);
        assert_eq!(max_key(&c), Some("a"));
        let c = counts(["z", "y", "z"]);
        assert_eq!(max_key(&c), Some("z"));
        assert_eq!(max_key(&BTreeMap::new()), None);
    }

    #[test]
    fn test_round_number() {
        assert_eq!(round_number(0.123456), 0.1235);
        assert_eq!(round_number(0.4 + 0.7), 1.1);
        assert_eq!(round_to(2.5, 0), 3.0);
    }

    #[test]
    fn test_finite_or_zero() {
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(finite_or_zero(1e-20), 0.0);
        assert_eq!(finite_or_zero(0.5), 0.5);
    }
}
