// Term dictionary and bag-of-words representations.
//
// Ids are handed out in first-seen order walking documents in corpus order
// and each document's terms in sorted order, so the same corpus always gets
// the same ids.

use std::collections::{BTreeSet, HashMap};

/// One document as `(term id, weight)` pairs, ascending by id.
pub type BagOfWords = Vec<(usize, f64)>;

/// Weights at or below this magnitude are dropped after TF-IDF.
const TFIDF_EPSILON: f64 = 1e-12;

/// Bijection between vocabulary terms and dense ids `0..len`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermDictionary {
    terms: Vec<String>,
    ids: HashMap<String, usize>,
}

impl TermDictionary {
    pub fn from_documents(documents: &[BTreeSet<String>]) -> Self {
        let mut dictionary = Self::default();
        for document in documents {
            for term in document {
                if !dictionary.ids.contains_key(term) {
                    dictionary.ids.insert(term.clone(), dictionary.terms.len());
                    dictionary.terms.push(term.clone());
                }
            }
        }
        dictionary
    }

    pub fn id(&self, term: &str) -> Option<usize> {
        self.ids.get(term).copied()
    }

    pub fn term(&self, id: usize) -> Option<&str> {
        self.terms.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Bag-of-words for one term set. Terms are unique per document, so
    /// every known term gets a count of 1.
    pub fn doc_to_bow(&self, document: &BTreeSet<String>) -> BagOfWords {
        let mut bow: BagOfWords = document
            .iter()
            .filter_map(|term| self.id(term))
            .map(|id| (id, 1.0))
            .collect();
        bow.sort_by_key(|&(id, _)| id);
        bow
    }
}

/// Re-weight a bag-of-words corpus with `tf * log2(N / df)`, L2-normalised
/// per document. Terms present in every document weigh zero and drop out.
pub fn tfidf(corpus: &[BagOfWords]) -> Vec<BagOfWords> {
    let n_docs = corpus.len() as f64;
    let mut document_frequency: HashMap<usize, usize> = HashMap::new();
    for bow in corpus {
        for &(id, _) in bow {
            *document_frequency.entry(id).or_insert(0) += 1;
        }
    }

    corpus
        .iter()
        .map(|bow| {
            let weighted: Vec<(usize, f64)> = bow
                .iter()
                .map(|&(id, tf)| {
                    let df = document_frequency.get(&id).copied().unwrap_or(1) as f64;
                    (id, tf * (n_docs / df).log2())
                })
                .collect();
            let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            weighted
                .into_iter()
                .map(|(id, w)| (id, if norm > 0.0 { w / norm } else { w }))
                .filter(|(_, w)| w.abs() > TFIDF_EPSILON)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(terms: &[&str]) -> BTreeSet<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_ids_follow_document_then_term_order() {
        let docs = vec![set(&["river", "delta"]), set(&["basin", "river"])];
        let dictionary = TermDictionary::from_documents(&docs);
        assert_eq!(dictionary.id("delta"), Some(0));
        assert_eq!(dictionary.id("river"), Some(1));
        assert_eq!(dictionary.id("basin"), Some(2));
        assert_eq!(dictionary.term(2), Some("basin"));
        assert_eq!(dictionary.len(), 3);
    }

    #[test]
    fn test_bow_uses_unit_counts() {
        let docs = vec![set(&["river", "delta"])];
        let dictionary = TermDictionary::from_documents(&docs);
        let bow = dictionary.doc_to_bow(&set(&["river", "delta", "unknown"]));
        assert_eq!(bow, vec![(0, 1.0), (1, 1.0)]);
    }

    #[test]
    fn test_tfidf_drops_ubiquitous_terms_and_normalises() {
        let corpus = vec![vec![(0, 1.0), (1, 1.0)], vec![(0, 1.0), (2, 1.0), (3, 1.0)]];
        let weighted = tfidf(&corpus);
        // term 0 is in both documents
        assert_eq!(weighted[0], vec![(1, 1.0)]);
        let norm: f64 = weighted[1].iter().map(|(_, w)| w * w).sum();
        assert!((norm - 1.0).abs() < 1e-9, "rows are unit length, got {norm}");
        assert!(weighted[1].iter().all(|&(id, _)| id != 0));
    }
}
