// N-gram feature sets for a single document.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex_lite::Regex;

/// Terms must be longer than this many characters.
pub const MAX_DISCARDED_CHARS: usize = 2;

/// Word tokens of two or more word characters.
static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("word pattern compiles"));

/// Lowercased word tokens in order.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Every contiguous n-gram of order 1 through `max_order`, space-joined,
/// as a set. Terms of two characters or fewer are dropped.
pub fn document_terms(text: &str, max_order: usize) -> BTreeSet<String> {
    let tokens = tokenize(text);
    let mut terms = BTreeSet::new();
    for order in 1..=max_order {
        if order > tokens.len() {
            break;
        }
        for window in tokens.windows(order) {
            let term = window.join(" ");
            if term.chars().count() > MAX_DISCARDED_CHARS {
                terms.insert(term);
            }
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unigrams_are_lowercased_and_unique() {
        let terms = document_terms("River flow river Flow", 1);
        let expected: BTreeSet<String> = ["flow", "river"].map(String::from).into();
        assert_eq!(terms, expected);
    }

    #[test]
    fn test_orders_up_to_max() {
        let terms = document_terms("upper river basin", 2);
        let expected: BTreeSet<String> =
            ["basin", "river", "river basin", "upper", "upper river"].map(String::from).into();
        assert_eq!(terms, expected);
    }

    #[test]
    fn test_short_terms_dropped() {
        // single letters never tokenize; two-letter unigrams are filtered
        let terms = document_terms("a ox is wet", 2);
        assert!(terms.iter().all(|t| t.chars().count() > 2));
        assert!(terms.contains("wet"));
        assert!(terms.contains("ox is"));
        assert!(!terms.contains("ox"));
    }

    #[test]
    fn test_order_beyond_token_count() {
        let terms = document_terms("delta", 5);
        assert_eq!(terms.len(), 1);
    }
}
