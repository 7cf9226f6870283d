//! Buffer operations: find, replace, identifier lookup and completion candidates
//!
//! Offsets are byte offsets into the buffer. The GUI works in character
//! indices, so [`char_to_byte`] and [`byte_to_char`] convert between the two.

use std::collections::BTreeSet;
use std::ops::Range;

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
];

/// A located definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// Zero-based line number
    pub line: usize,
    /// Byte range of the whole line, without the newline
    pub range: Range<usize>,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Clamp `offset` into `content` and move it back onto a char boundary
fn floor_boundary(content: &str, offset: usize) -> usize {
    let mut offset = offset.min(content.len());
    while !content.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Find `query` at or after `from`, wrapping around to the start
pub fn find(content: &str, query: &str, from: usize) -> Option<Range<usize>> {
    if query.is_empty() {
        return None;
    }

    let from = floor_boundary(content, from);
    content[from..]
        .find(query)
        .map(|i| from + i)
        .or_else(|| content.find(query))
        .map(|start| start..start + query.len())
}

/// Replace every occurrence of `query`; `None` when nothing matched
pub fn replace_all(content: &str, query: &str, replacement: &str) -> Option<(String, usize)> {
    if query.is_empty() {
        return None;
    }

    let count = content.matches(query).count();
    if count == 0 {
        return None;
    }
    Some((content.replace(query, replacement), count))
}

fn word_start(content: &str, offset: usize) -> usize {
    content[..offset]
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_word_char(*c))
        .last()
        .map(|(i, _)| i)
        .unwrap_or(offset)
}

/// The identifier containing or touching `offset`
pub fn word_at(content: &str, offset: usize) -> Option<Range<usize>> {
    let offset = floor_boundary(content, offset);
    let start = word_start(content, offset);
    let end = content[offset..]
        .char_indices()
        .find(|(_, c)| !is_word_char(*c))
        .map(|(i, _)| offset + i)
        .unwrap_or(content.len());

    (start < end).then_some(start..end)
}

/// The identifier characters immediately before `offset`
pub fn prefix_at(content: &str, offset: usize) -> &str {
    let offset = floor_boundary(content, offset);
    &content[word_start(content, offset)..offset]
}

/// Find the line that declares `word` as a function, class or type
pub fn find_definition(content: &str, word: &str) -> Option<Definition> {
    if word.is_empty() || !word.chars().all(is_word_char) {
        return None;
    }

    let pattern = format!(
        r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?[ \t]+)?(?:(?:async|const|unsafe)[ \t]+)*(?:def|class|fn|struct|enum|trait|type|mod|const|static)[ \t]+{}",
        regex_lite::escape(word)
    );
    let re = regex_lite::Regex::new(&pattern).ok()?;
    // regex-lite word boundaries are ASCII-only
    let found = re.find_iter(content).find(|m| {
        !content[m.end()..]
            .chars()
            .next()
            .is_some_and(is_word_char)
    })?;

    let start = found.start();
    let end = content[start..]
        .find('\n')
        .map(|i| start + i)
        .unwrap_or(content.len());
    let line = content[..start].matches('\n').count();

    Some(Definition {
        line,
        range: start..end,
    })
}

/// Iterate over the identifiers in `content`
pub fn words(content: &str) -> impl Iterator<Item = &str> {
    content.split(|c: char| !is_word_char(c)).filter(|w| !w.is_empty())
}

/// Number of identifiers in `content`
pub fn word_count(content: &str) -> usize {
    words(content).count()
}

fn keywords(language: &str) -> &'static [&'static str] {
    match language {
        "rs" | "rust" => RUST_KEYWORDS,
        _ => PYTHON_KEYWORDS,
    }
}

/// Completion candidates from language keywords and words already in the buffer
pub fn local_completions(content: &str, prefix: &str, language: &str) -> Vec<String> {
    if prefix.is_empty() {
        return Vec::new();
    }

    keywords(language)
        .iter()
        .copied()
        .chain(words(content))
        .filter(|w| w.starts_with(prefix) && *w != prefix)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Convert a character index into a byte offset
pub fn char_to_byte(content: &str, char_index: usize) -> usize {
    content
        .char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(content.len())
}

/// Convert a byte offset into a character index
pub fn byte_to_char(content: &str, byte_offset: usize) -> usize {
    content[..floor_boundary(content, byte_offset)].chars().count()
}
