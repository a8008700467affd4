// Lexical normalization: from sanitized text to a lemma string.
//
// Sentences are approximated by splitting on periods. Short sentences and
// ones opening with a publisher or metadata phrase are dropped, then the
// rest is tokenized on whitespace, repaired (hyphen splits, "Name et al"
// citations), stopword-filtered and lemmatized.

use super::lemma::Lemmatizer;
use super::stopwords::Stopwords;

/// Sentences starting with these (case-sensitive) are front matter or
/// licence notices that survived section detection.
pub const BOILERPLATE_OPENERS: &[&str] = &[
    "All authors have read and agreed",
    "All rights reserved",
    "ARTICLE HISTORY",
    "Author Contributions",
    "BioOne sees sustainable",
    "Citation",
    "Commercial inquiries",
    "Contents list available",
    "Correspondence to",
    "Corresponding author",
    "Data Availability Statement",
    "Declaration of Competing Interest",
    "Declaration of conflicting interest",
    "Funding",
    "Full Terms",
    "Informed Consent Statement",
    "Institutional Review Board",
    "Journal of",
    "Key Points",
    "KEY WORDS",
    "Key Words",
    "Key words",
    "Keywords",
    "No part of this periodical",
    "Open Access",
    "Page number",
    "Posted online",
    "Published in",
    "Published online",
    "Submit your article",
    "Supplemental Material",
    "SUPPLEMENTARY MATERIAL",
    "Supplementary Information",
    "Supporting information",
    "This manuscript was submitted on",
    "Your use of this PDF",
];

/// Sentences at or under this many characters are table cells or units.
const MIN_SENTENCE_CHARS: usize = 4;

/// Normalize one sanitized text blob into space-joined lemmas.
pub fn normalize_text(text: &str, stopwords: &Stopwords, lemmatizer: &Lemmatizer) -> String {
    let sentences = keep_sentences(text);
    let tokens: Vec<String> = sentences
        .join(" ")
        .split_whitespace()
        .map(str::to_string)
        .collect();

    let tokens = remove_citations(merge_hyphenated(tokens));

    tokens
        .into_iter()
        .filter(|token| !stopwords.contains(token))
        .map(|token| lemmatizer.lemmatize_all(&token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Period-delimited sentences, trimmed, without short or boilerplate ones.
pub fn keep_sentences(text: &str) -> Vec<String> {
    text.replace('\n', " ")
        .split('.')
        .map(|sentence| sentence.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|sentence| sentence.chars().count() > MIN_SENTENCE_CHARS)
        .filter(|sentence| {
            !BOILERPLATE_OPENERS
                .iter()
                .any(|opener| sentence.starts_with(opener))
        })
        .collect()
}

fn is_split_word(token: &str) -> bool {
    token.len() > 1 && token.ends_with('-') && token.matches('-').count() == 1
}

/// Join `sedi-` + `ment` into `sediment`. A trailing split token with no
/// successor is kept as-is.
pub fn merge_hyphenated(tokens: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter();
    while let Some(mut token) = iter.next() {
        while is_split_word(&token) {
            let Some(next) = iter.next() else { break };
            token.pop();
            token.push_str(&next);
        }
        out.push(token);
    }
    out
}

/// Drop every `Name et al` triple. Removal happens as tokens are pushed, so
/// a fragment exposed by an earlier removal is caught too and the output
/// never holds `et` directly followed by `al`.
pub fn remove_citations(tokens: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tokens.len());
    for token in tokens {
        out.push(token);
        let n = out.len();
        if n >= 2 && out[n - 2] == "et" && out[n - 1] == "al" {
            let keep = n.saturating_sub(3);
            out.truncate(keep);
        }
    }
    out
}
