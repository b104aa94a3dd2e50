//! Small text helpers shared by the parsers and categorizers.

/// Returns true if `term` occurs in `haystack` on word boundaries.
///
/// Both arguments are expected to be lower-case already.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(term) {
        let at = start + pos;
        let end = at + term.len();
        let before_ok = haystack[..at]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        start = at + haystack[at..].chars().next().map_or(1, char::len_utf8);
    }
    false
}

/// Counts how many of `terms` occur in `haystack` on word boundaries.
pub fn count_terms(haystack: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|t| contains_term(haystack, t)).count()
}

/// Collapses runs of whitespace into single spaces and trims.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Upper-cases the first letter of each word, keeping `&` and short
/// connector words as they are.
pub fn title_case(s: &str) -> String {
    collapse_whitespace(s)
        .split(' ')
        .enumerate()
        .map(|(i, word)| {
            let lower = word.to_lowercase();
            if i > 0 && matches!(lower.as_str(), "and" | "of" | "for" | "the" | "&") {
                return lower;
            }
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Truncates to at most `max` characters on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.to_string(),
    }
}

/// Returns true for emoji and other decorative symbols deal posts are full of.
pub fn is_decoration(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1FAFF
        | 0x2600..=0x27BF
        | 0x2B00..=0x2BFF
        | 0xFE00..=0xFE0F
        | 0x200D
        | 0x20E3
    )
}

/// Removes decorative symbols and trims.
pub fn strip_decorations(s: &str) -> String {
    let cleaned: String = s.chars().filter(|c| !is_decoration(*c)).collect();
    collapse_whitespace(&cleaned)
}
