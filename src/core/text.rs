/// Surface text helpers shared by the extractor, the rewriter and the scorers.
///
/// All keyword matching is ASCII case-insensitive substring matching with no
/// stemming. Positions are byte offsets into the original string.
use regex::Regex;
use std::sync::LazyLock;

static CAPITALIZED_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][a-z]+\b").expect("static pattern"));

static CAPITALIZED_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)*\b").expect("static pattern")
});

/// Characters that end a sentence.
pub const SENTENCE_ENDERS: &[char] = &['.', '!', '?'];

/// A capitalized word and its byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub start: usize,
    pub end: usize,
}

/// Every `[A-Z][a-z]+` word, in text order.
pub fn capitalized_words(text: &str) -> Vec<Token<'_>> {
    CAPITALIZED_WORD
        .find_iter(text)
        .map(|m| Token {
            text: m.as_str(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Runs of capitalized words separated only by spaces or tabs, in text order.
/// Each run is returned as its list of words.
pub fn capitalized_runs(text: &str) -> Vec<Vec<&str>> {
    CAPITALIZED_RUN
        .find_iter(text)
        .map(|m| m.as_str().split_whitespace().collect())
        .collect()
}

/// Capitalized runs with their byte spans, in text order.
pub fn capitalized_run_spans(text: &str) -> Vec<Token<'_>> {
    CAPITALIZED_RUN
        .find_iter(text)
        .map(|m| Token {
            text: m.as_str(),
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Split on runs of `.`, `!`, `?`. Segments may be empty or whitespace-only.
pub fn sentences(text: &str) -> Vec<&str> {
    text.split(SENTENCE_ENDERS).collect()
}

/// Sentence segments with byte spans. Line breaks also end a segment, so a
/// segment never spans two lines of a script.
pub fn sentence_spans(text: &str) -> Vec<Token<'_>> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '\n' || SENTENCE_ENDERS.contains(&c) {
            spans.push(Token {
                text: &text[start..i],
                start,
                end: i,
            });
            start = i + c.len_utf8();
        }
    }
    spans.push(Token {
        text: &text[start..],
        start,
        end: text.len(),
    });
    spans
}

/// Number of non-blank sentence segments.
pub fn sentence_count(text: &str) -> usize {
    sentences(text)
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .count()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Lowercase alphanumeric words; apostrophes and punctuation split words.
pub fn lowercase_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Alphanumeric words with their byte spans, in text order.
pub fn word_spans(text: &str) -> Vec<Token<'_>> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (i, c) in text.char_indices() {
        match (c.is_alphanumeric(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                spans.push(Token {
                    text: &text[s..i],
                    start: s,
                    end: i,
                });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push(Token {
            text: &text[s..],
            start: s,
            end: text.len(),
        });
    }
    spans
}

/// Byte offset of the first ASCII case-insensitive occurrence of `needle`.
pub fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    find_ci_from(haystack, needle, 0)
}

fn find_ci_from(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack
        .char_indices()
        .map(|(i, _)| i)
        .filter(|i| *i >= from)
        .find(|i| {
            haystack
                .get(*i..*i + needle.len())
                .is_some_and(|s| s.eq_ignore_ascii_case(needle))
        })
}

pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    find_ci(haystack, needle).is_some()
}

/// Non-overlapping ASCII case-insensitive occurrences of `needle`.
pub fn count_ci(haystack: &str, needle: &str) -> usize {
    let mut count = 0;
    let mut from = 0;
    while let Some(pos) = find_ci_from(haystack, needle, from) {
        count += 1;
        from = pos + needle.len();
    }
    count
}

/// Replace the first case-insensitive occurrence of `needle`. The
/// replacement is capitalized when the matched text was.
///
/// Returns `None` when `needle` does not occur.
pub fn replace_first_ci(haystack: &str, needle: &str, replacement: &str) -> Option<String> {
    let start = find_ci(haystack, needle)?;
    let end = start + needle.len();
    let matched = &haystack[start..end];
    let mut out = String::with_capacity(haystack.len() + replacement.len());
    out.push_str(&haystack[..start]);
    out.push_str(&match_case(matched, replacement));
    out.push_str(&haystack[end..]);
    Some(out)
}

/// Capitalize `replacement` if `original` starts with an uppercase letter.
pub fn match_case(original: &str, replacement: &str) -> String {
    let starts_upper = original.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return replacement.to_string();
    }
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Insert `, <phrase>` after the byte offset `at`, closing with a comma
/// unless one already follows.
pub fn insert_appositive(text: &str, at: usize, phrase: &str) -> String {
    let (head, tail) = text.split_at(at);
    if tail.starts_with(',') {
        format!("{head}, {phrase}{tail}")
    } else {
        format!("{head}, {phrase},{tail}")
    }
}

/// "a" or "an" for a following word, by its first letter.
pub fn indefinite_article(word: &str) -> &'static str {
    match word.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}
