// Corpus building: cleaned documents to the representation LDA trains on.
//
// Each document becomes a set of n-gram terms. The sets, the dictionary
// built over them and the bag-of-words vectors are fixed once built and
// shared read-only by every fit in a calibration run.

pub mod dictionary;
pub mod ngrams;

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::info;

use crate::error::PipelineError;
use dictionary::{BagOfWords, TermDictionary};

/// How many of the most frequent terms the report lists.
pub const TOP_TERMS: usize = 100;

/// High-frequency terms that carry little topical signal in this
/// collection. Removed when suppression is chosen.
pub const COMMON_TERMS: &[&str] = &[
    "river",
    "mississippi",
    "mississippi river",
    "water",
    "area",
    "high",
    "low",
    "large",
    "data",
    "time",
    "increase",
    "analysis",
    "result",
    "system",
    "range",
    "year",
    "indicate",
    "great",
    "occur",
    "change",
    "long",
    "level",
    "present",
    "similar",
    "determine",
    "number",
    "value",
    "small",
    "location",
    "report",
    "condition",
    "compare",
    "effect",
    "period",
    "first",
    "represent",
    "upper",
    "different",
    "measure",
    "average",
    "estimate",
    "site",
    "important",
    "available",
    "significant",
    "term",
    "flow",
    "information",
    "limit",
    "reduce",
    "process",
    "state",
    "difference",
    "associate",
    "potential",
    "source",
    "point",
    "remain",
    "surface",
    "observe",
    "identify",
    "sample",
    "collect",
    "factor",
    "describe",
    "develop",
    "rate",
    "vary",
    "mean",
    "natural",
    "basin",
    "affect",
    "major",
    "model",
    "control",
    "likely",
    "scale",
    "example",
    "decrease",
    "cause",
    "distribution",
    "reach",
    "size",
    "relatively",
    "early",
    "environmental",
    "type",
    "management",
    "select",
    "new",
    "generally",
    "field",
    "survey",
    "relative",
    "require",
    "specific",
    "research",
    "land",
    "quality",
    "individual",
];

/// The documents of one modelling run as term sets, plus their dictionary
/// and bag-of-words vectors.
#[derive(Debug, Clone)]
pub struct TrainingCorpus {
    pub documents: Vec<BTreeSet<String>>,
    pub dictionary: TermDictionary,
    pub bows: Vec<BagOfWords>,
}

impl TrainingCorpus {
    /// Build the dictionary and vectors over `documents`, re-weighting with
    /// TF-IDF when asked.
    pub fn new(documents: Vec<BTreeSet<String>>, use_tfidf: bool) -> Self {
        let dictionary = TermDictionary::from_documents(&documents);
        let counts: Vec<BagOfWords> = documents.iter().map(|d| dictionary.doc_to_bow(d)).collect();
        let bows = if use_tfidf {
            dictionary::tfidf(&counts)
        } else {
            counts
        };
        Self {
            documents,
            dictionary,
            bows,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Sum of term-set sizes. Bounds the seed sweep.
    pub fn total_tokens(&self) -> usize {
        self.documents.iter().map(BTreeSet::len).sum()
    }
}

/// Result of corpus building: the term sets and the frequency snapshot
/// reported alongside the model.
#[derive(Debug, Clone)]
pub struct CorpusBuild {
    pub documents: Vec<BTreeSet<String>>,
    /// Number of documents each term appears in.
    pub frequencies: HashMap<String, usize>,
    /// The most frequent terms after any suppression, highest first.
    pub top_terms: Vec<(String, usize)>,
}

/// Expand cleaned texts into n-gram term sets and count term frequencies.
///
/// Fails with `DegenerateCorpus` when there are no documents or any
/// document ends up with no terms.
pub fn build_corpus(
    texts: &[String],
    ngram_order: usize,
    suppression: Option<&[&str]>,
) -> Result<CorpusBuild, PipelineError> {
    if texts.is_empty() {
        return Err(PipelineError::DegenerateCorpus(
            "the selection contains no documents".to_string(),
        ));
    }

    let documents: Vec<BTreeSet<String>> = texts
        .iter()
        .map(|text| ngrams::document_terms(text, ngram_order))
        .collect();
    check_nonempty(&documents)?;

    let frequencies = term_frequencies(&documents);
    let (frequencies, documents) = match suppression {
        Some(list) => {
            let (frequencies, documents) = apply_suppression(frequencies, documents, list);
            check_nonempty(&documents)?;
            (frequencies, documents)
        }
        None => (frequencies, documents),
    };

    let top_terms = top_terms(&frequencies, TOP_TERMS);
    info!(
        documents = documents.len(),
        vocabulary = frequencies.len(),
        ngram_order,
        suppressed = suppression.is_some(),
        "Corpus built"
    );

    Ok(CorpusBuild {
        documents,
        frequencies,
        top_terms,
    })
}

fn check_nonempty(documents: &[BTreeSet<String>]) -> Result<(), PipelineError> {
    match documents.iter().position(BTreeSet::is_empty) {
        Some(index) => Err(PipelineError::DegenerateCorpus(format!(
            "document {} has no terms left",
            index + 1
        ))),
        None => Ok(()),
    }
}

/// Document frequency of every term.
pub fn term_frequencies(documents: &[BTreeSet<String>]) -> HashMap<String, usize> {
    let mut frequencies = HashMap::new();
    for document in documents {
        for term in document {
            *frequencies.entry(term.clone()).or_insert(0) += 1;
        }
    }
    frequencies
}

/// Remove every listed term from the frequency map and every document.
/// Builds new containers instead of deleting while iterating.
pub fn apply_suppression(
    frequencies: HashMap<String, usize>,
    documents: Vec<BTreeSet<String>>,
    list: &[&str],
) -> (HashMap<String, usize>, Vec<BTreeSet<String>>) {
    let banned: HashSet<&str> = list.iter().copied().collect();
    let frequencies = frequencies
        .into_iter()
        .filter(|(term, _)| !banned.contains(term.as_str()))
        .collect();
    let documents = documents
        .into_iter()
        .map(|doc| {
            doc.into_iter()
                .filter(|term| !banned.contains(term.as_str()))
                .collect()
        })
        .collect();
    (frequencies, documents)
}

/// The `n` most frequent terms, ties broken alphabetically.
pub fn top_terms(frequencies: &HashMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = frequencies
        .iter()
        .map(|(term, &count)| (term.clone(), count))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_empty_selection_is_degenerate() {
        let err = build_corpus(&[], 1, None).unwrap_err();
        assert!(matches!(err, PipelineError::DegenerateCorpus(_)));
    }

    #[test]
    fn test_document_without_terms_is_degenerate() {
        let err = build_corpus(&texts(&["sediment delta", "a b"]), 1, None).unwrap_err();
        assert!(matches!(err, PipelineError::DegenerateCorpus(_)));
    }

    #[test]
    fn test_suppression_can_empty_a_document() {
        let err = build_corpus(&texts(&["river water", "delta"]), 1, Some(COMMON_TERMS))
            .unwrap_err();
        assert!(matches!(err, PipelineError::DegenerateCorpus(_)));
    }

    #[test]
    fn test_frequencies_count_documents() {
        let build = build_corpus(&texts(&["levee levee crest", "levee scour"]), 1, None).unwrap();
        assert_eq!(build.frequencies["levee"], 2);
        assert_eq!(build.frequencies["crest"], 1);
        assert_eq!(build.top_terms[0], ("levee".to_string(), 2));
        assert_eq!(build.top_terms[1].0, "crest", "ties sort alphabetically");
    }

    #[test]
    fn test_suppression_rebuilds_both_containers() {
        let documents = vec![
            ["river", "delta"].map(String::from).into(),
            ["river", "scour"].map(String::from).into(),
        ];
        let frequencies = HashMap::from([
            ("river".to_string(), 500),
            ("delta".to_string(), 1),
            ("scour".to_string(), 1),
        ]);
        let (frequencies, documents) = apply_suppression(frequencies, documents, &["river"]);
        assert!(!frequencies.contains_key("river"));
        assert!(documents.iter().all(|d: &BTreeSet<String>| !d.contains("river")));
        assert_eq!(frequencies.len(), 2);
    }

    #[test]
    fn test_training_corpus_total_tokens() {
        let documents: Vec<BTreeSet<String>> = vec![
            ["delta", "levee"].map(String::from).into(),
            ["levee"].map(String::from).into(),
        ];
        let corpus = TrainingCorpus::new(documents, false);
        assert_eq!(corpus.total_tokens(), 3);
        assert_eq!(corpus.dictionary.len(), 2);
        assert_eq!(corpus.bows[1], vec![(1, 1.0)]);
    }
}
