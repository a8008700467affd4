// u_mass topic coherence.
//
// For each topic's top terms w_1..w_n (most probable first), every pair
// (w_i, w_j) with j < i scores
//
//   ln((D(w_i, w_j) / N + 1e-12) / (D(w_j) / N))
//
// where D counts training documents containing the terms and N is the
// number of documents. A topic scores the mean of its pairs, a model the
// mean of its topics. Values are <= 0 in practice; closer to zero is more
// coherent.

use crate::corpus::dictionary::BagOfWords;
use crate::corpus::TrainingCorpus;

use super::lda::TrainedModel;

/// Top terms per topic used for coherence.
pub const COHERENCE_TOP_N: usize = 20;

const SMOOTHING: f64 = 1e-12;

/// Which documents contain each term: sorted posting lists by term id.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    postings: Vec<Vec<usize>>,
    num_documents: usize,
}

impl DocumentIndex {
    pub fn new(corpus: &[BagOfWords], vocabulary_size: usize) -> Self {
        let mut postings = vec![Vec::new(); vocabulary_size];
        for (doc, bow) in corpus.iter().enumerate() {
            for &(term, _) in bow {
                if let Some(list) = postings.get_mut(term) {
                    if list.last() != Some(&doc) {
                        list.push(doc);
                    }
                }
            }
        }
        Self {
            postings,
            num_documents: corpus.len(),
        }
    }

    /// Index over the term sets of a training corpus. Built from the sets
    /// rather than the model vectors, which may have dropped terms after
    /// TF-IDF weighting.
    pub fn for_corpus(corpus: &TrainingCorpus) -> Self {
        let bows: Vec<BagOfWords> = corpus
            .documents
            .iter()
            .map(|doc| corpus.dictionary.doc_to_bow(doc))
            .collect();
        Self::new(&bows, corpus.dictionary.len())
    }

    pub fn num_documents(&self) -> usize {
        self.num_documents
    }

    /// Number of documents containing `term`.
    pub fn document_frequency(&self, term: usize) -> usize {
        self.postings.get(term).map_or(0, Vec::len)
    }

    /// Number of documents containing both terms.
    pub fn co_document_frequency(&self, a: usize, b: usize) -> usize {
        let (Some(left), Some(right)) = (self.postings.get(a), self.postings.get(b)) else {
            return 0;
        };
        let (mut i, mut j, mut count) = (0, 0, 0);
        while i < left.len() && j < right.len() {
            match left[i].cmp(&right[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    count += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        count
    }
}

/// u_mass coherence of one ranked term list. Returns 0.0 when there is no
/// pair to score.
pub fn topic_coherence(terms: &[usize], index: &DocumentIndex) -> f64 {
    let n = index.num_documents() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mut total = 0.0;
    let mut pairs = 0usize;
    for i in 1..terms.len() {
        for j in 0..i {
            let denominator = index.document_frequency(terms[j]) as f64 / n;
            if denominator == 0.0 {
                continue;
            }
            let joint = index.co_document_frequency(terms[i], terms[j]) as f64 / n;
            total += ((joint + SMOOTHING) / denominator).ln();
            pairs += 1;
        }
    }
    if pairs == 0 {
        0.0
    } else {
        total / pairs as f64
    }
}

/// Mean u_mass coherence over all topics of `model`, each topic scored on
/// its `COHERENCE_TOP_N` most probable terms.
pub fn model_coherence(model: &TrainedModel, index: &DocumentIndex) -> f64 {
    let scores: Vec<f64> = ranked_topic_terms(model, COHERENCE_TOP_N)
        .iter()
        .map(|terms| topic_coherence(terms, index))
        .collect();
    if scores.is_empty() {
        0.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    }
}

/// Term ids of the `n` most probable terms of every topic.
pub fn ranked_topic_terms(model: &TrainedModel, n: usize) -> Vec<Vec<usize>> {
    (0..model.num_topics())
        .map(|topic| model.topic_terms(topic, n).into_iter().map(|(id, _)| id).collect())
        .collect()
}
