//! Keyword gate for post bodies. Pure, no I/O: a term counts only as a
//! whole word (case-insensitive), never as a substring of a longer word.

const BANNED_KEYWORDS: [&str; 22] = [
    "guns", "gun", "weapon", "weapons", "violence", "violent", "kill", "murder",
    "hate", "racist", "terrorism", "terrorist", "bomb", "explosive", "drugs",
    "cocaine", "heroin", "meth", "suicide", "self-harm", "nazi", "hitler",
];

pub fn is_allowed(text: &str) -> bool {
    violating_terms(text).is_empty()
}

/// Every denylist term appearing in `text` as a whole word, for surfacing
/// back to the author.
pub fn violating_terms(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    BANNED_KEYWORDS
        .iter()
        .copied()
        .filter(|term| contains_word(&lower, term))
        .collect()
}

fn contains_word(haystack: &str, term: &str) -> bool {
    let mut from = 0;
    while let Some(pos) = haystack[from..].find(term) {
        let start = from + pos;
        let end = start + term.len();

        let boundary_before = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let boundary_after = haystack[end..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());

        if boundary_before && boundary_after {
            return true;
        }
        from = start + 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_whole_words_only() {
        assert!(!is_allowed("I own a gun"));
        assert_eq!(violating_terms("I own a gun"), vec!["gun"]);

        // "stunning" contains "gun" but is not a whole-word match
        assert!(is_allowed("what a stunning view"));
        assert!(is_allowed("begun"));
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(violating_terms("GUNS everywhere"), vec!["guns"]);
        assert!(!is_allowed("Violence is never the answer"));
    }

    #[test]
    fn collects_every_matched_term() {
        let terms = violating_terms("guns and drugs");
        assert!(terms.contains(&"guns"));
        assert!(terms.contains(&"drugs"));
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn hyphenated_terms_match_as_words() {
        assert!(!is_allowed("struggling with self-harm"));
        // embedded in a longer token on either side is not a word match
        assert!(is_allowed("myself-harmony"));
    }

    #[test]
    fn punctuation_counts_as_a_boundary() {
        assert!(!is_allowed("gun."));
        assert!(!is_allowed("(gun)"));
        assert!(!is_allowed("gun"));
    }

    #[test]
    fn clean_text_passes() {
        assert!(is_allowed("a perfectly ordinary thought"));
        assert!(violating_terms("").is_empty());
    }
}
