// Latent Dirichlet Allocation by batch variational Bayes.
//
// Each pass runs the E-step over every document (per-document gamma
// updates against the current topic-term expectations) and then one
// M-step (lambda = eta + sufficient statistics). Lambda starts from
// Gamma(100, 1/100) draws taken from a seeded StdRng, so a given seed
// always reproduces the same model.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Gamma};
use thiserror::Error;

use super::traits::TopicModeler;
use crate::corpus::dictionary::BagOfWords;
use crate::corpus::TrainingCorpus;

/// Priors are floored here so a swept value of zero still fits.
pub const MIN_PRIOR: f64 = 1e-6;

/// Default topic-term prior.
pub const DEFAULT_ETA: f64 = 0.1;

const PHI_EPSILON: f64 = 1e-100;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LdaError {
    #[error("Number of topics must be positive")]
    InvalidTopicCount,

    #[error("Cannot fit a topic model on an empty corpus")]
    EmptyCorpus,

    #[error("Invalid LDA parameter: {0}")]
    InvalidParameter(String),
}

/// Default document-topic prior for `num_topics` topics (50 / k).
pub fn default_alpha(num_topics: usize) -> f64 {
    50.0 / num_topics.max(1) as f64
}

/// Fit parameters, built like `LdaParams::new(4).seed(7).passes(50)`.
#[derive(Debug, Clone, PartialEq)]
pub struct LdaParams {
    pub num_topics: usize,
    /// Document-topic prior.
    pub alpha: f64,
    /// Topic-term prior.
    pub eta: f64,
    pub seed: u64,
    /// Full E-step/M-step sweeps over the corpus.
    pub passes: usize,
    /// Cap on per-document gamma iterations.
    pub iterations: usize,
    /// Mean absolute gamma change that ends a document's iterations.
    pub gamma_threshold: f64,
}

impl LdaParams {
    pub fn new(num_topics: usize) -> Self {
        Self {
            num_topics,
            alpha: default_alpha(num_topics),
            eta: DEFAULT_ETA,
            seed: 0,
            passes: 1,
            iterations: 50,
            gamma_threshold: 0.001,
        }
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn eta(mut self, eta: f64) -> Self {
        self.eta = eta;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    fn validate(&self) -> Result<(), LdaError> {
        if self.num_topics == 0 {
            return Err(LdaError::InvalidTopicCount);
        }
        if self.passes == 0 || self.iterations == 0 {
            return Err(LdaError::InvalidParameter(
                "passes and iterations must be at least 1".to_string(),
            ));
        }
        for (name, value) in [("alpha", self.alpha), ("eta", self.eta)] {
            if !value.is_finite() || value < 0.0 {
                return Err(LdaError::InvalidParameter(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// A fitted model: topic-term and document-topic probabilities.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    /// `num_topics x vocabulary_size`, rows sum to 1.
    topic_term: Array2<f64>,
    /// `num_documents x num_topics`, rows sum to 1.
    doc_topic: Array2<f64>,
    params: LdaParams,
}

impl TrainedModel {
    /// Assemble a model from unnormalised weights. Rows are normalised to
    /// probabilities; an all-zero row becomes uniform.
    pub fn from_weights(topic_term: Array2<f64>, doc_topic: Array2<f64>, params: LdaParams) -> Self {
        Self {
            topic_term: normalize_rows(topic_term),
            doc_topic: normalize_rows(doc_topic),
            params,
        }
    }

    pub fn num_topics(&self) -> usize {
        self.topic_term.nrows()
    }

    pub fn vocabulary_size(&self) -> usize {
        self.topic_term.ncols()
    }

    pub fn num_documents(&self) -> usize {
        self.doc_topic.nrows()
    }

    pub fn params(&self) -> &LdaParams {
        &self.params
    }

    pub fn term_probability(&self, topic: usize, term: usize) -> f64 {
        self.topic_term[[topic, term]]
    }

    /// The `n` most probable terms of `topic` as `(term id, probability)`,
    /// ties broken by lower id.
    pub fn topic_terms(&self, topic: usize, n: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> =
            self.topic_term.row(topic).iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(n);
        ranked
    }

    /// Full topic distribution of a training document. No topic is
    /// truncated, however small.
    pub fn document_topics(&self, document: usize) -> Vec<f64> {
        self.doc_topic.row(document).to_vec()
    }

    /// Most probable topic of a training document (0-indexed, first on ties).
    pub fn dominant_topic(&self, document: usize) -> usize {
        argmax_first(self.doc_topic.row(document).iter().copied())
    }
}

fn argmax_first(values: impl Iterator<Item = f64>) -> usize {
    let mut best = (0, f64::NEG_INFINITY);
    for (index, value) in values.enumerate() {
        if value > best.1 {
            best = (index, value);
        }
    }
    best.0
}

fn normalize_rows(mut matrix: Array2<f64>) -> Array2<f64> {
    let width = matrix.ncols() as f64;
    for mut row in matrix.axis_iter_mut(Axis(0)) {
        let total = row.sum();
        if total > 0.0 {
            row.mapv_inplace(|v| v / total);
        } else {
            row.fill(1.0 / width);
        }
    }
    matrix
}

/// Fit LDA over `corpus`, whose term ids must be below `vocabulary_size`.
pub fn fit(
    corpus: &[BagOfWords],
    vocabulary_size: usize,
    params: &LdaParams,
) -> Result<TrainedModel, LdaError> {
    params.validate()?;
    if corpus.is_empty() || vocabulary_size == 0 {
        return Err(LdaError::EmptyCorpus);
    }
    let total_weight: f64 = corpus.iter().flatten().map(|&(_, weight)| weight).sum();
    if total_weight <= 0.0 {
        return Err(LdaError::EmptyCorpus);
    }
    if let Some(&(id, _)) = corpus.iter().flatten().find(|&&(id, _)| id >= vocabulary_size) {
        return Err(LdaError::InvalidParameter(format!(
            "term id {id} outside a vocabulary of {vocabulary_size}"
        )));
    }

    let k = params.num_topics;
    let alpha = params.alpha.max(MIN_PRIOR);
    let eta = params.eta.max(MIN_PRIOR);

    let mut rng = StdRng::seed_from_u64(params.seed);
    let init = Gamma::new(100.0, 0.01).map_err(|e| LdaError::InvalidParameter(e.to_string()))?;
    let mut lambda = Array2::from_shape_fn((k, vocabulary_size), |_| init.sample(&mut rng));
    let mut gamma = Array2::<f64>::zeros((corpus.len(), k));

    for _ in 0..params.passes {
        let exp_elog_beta = exp_dirichlet_expectation(&lambda);
        let mut sstats = Array2::<f64>::zeros((k, vocabulary_size));
        for (index, bow) in corpus.iter().enumerate() {
            let doc_gamma = infer_document(bow, &exp_elog_beta, alpha, params, &mut sstats);
            gamma.row_mut(index).assign(&doc_gamma);
        }
        lambda = sstats.mapv(|s| s + eta);
    }

    Ok(TrainedModel::from_weights(lambda, gamma, params.clone()))
}

/// The production modeler: `fit` over the corpus's bag-of-words vectors.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariationalLda;

impl TopicModeler for VariationalLda {
    fn fit(&self, corpus: &TrainingCorpus, params: &LdaParams) -> Result<TrainedModel, LdaError> {
        fit(&corpus.bows, corpus.dictionary.len(), params)
    }
}

/// E-step for one document. Returns its gamma and adds its expected term
/// counts into `sstats`.
fn infer_document(
    bow: &BagOfWords,
    exp_elog_beta: &Array2<f64>,
    alpha: f64,
    params: &LdaParams,
    sstats: &mut Array2<f64>,
) -> Array1<f64> {
    let k = exp_elog_beta.nrows();
    if bow.is_empty() {
        return Array1::from_elem(k, alpha);
    }

    let length: f64 = bow.iter().map(|&(_, count)| count).sum();
    let mut gamma = Array1::from_elem(k, alpha + length / k as f64);
    let mut exp_elog_theta = exp_dirichlet_expectation_row(&gamma);

    for _ in 0..params.iterations {
        let mut next = Array1::from_elem(k, alpha);
        for &(term, count) in bow {
            let beta = exp_elog_beta.column(term);
            let phinorm = exp_elog_theta.dot(&beta) + PHI_EPSILON;
            next.scaled_add(count / phinorm, &(&exp_elog_theta * &beta));
        }
        let mean_change = (&next - &gamma).mapv(f64::abs).mean().unwrap_or(0.0);
        gamma = next;
        exp_elog_theta = exp_dirichlet_expectation_row(&gamma);
        if mean_change < params.gamma_threshold {
            break;
        }
    }

    for &(term, count) in bow {
        let beta = exp_elog_beta.column(term);
        let phinorm = exp_elog_theta.dot(&beta) + PHI_EPSILON;
        let contribution = &exp_elog_theta * &beta * (count / phinorm);
        let mut column = sstats.column_mut(term);
        column += &contribution;
    }
    gamma
}

/// `exp(E[log X])` for each row of Dirichlet parameters.
fn exp_dirichlet_expectation(params: &Array2<f64>) -> Array2<f64> {
    let totals = params.sum_axis(Axis(1));
    let mut out = params.mapv(digamma);
    for (mut row, total) in out.axis_iter_mut(Axis(0)).zip(totals.iter()) {
        let psi_total = digamma(*total);
        row.mapv_inplace(|v| (v - psi_total).exp());
    }
    out
}

fn exp_dirichlet_expectation_row(params: &Array1<f64>) -> Array1<f64> {
    let psi_total = digamma(params.sum());
    params.mapv(|v| (digamma(v) - psi_total).exp())
}

/// Digamma for positive arguments: shift up with the recurrence, then the
/// asymptotic series.
fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    let series = f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))));
    result + x.ln() - 0.5 / x - series
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<BagOfWords> {
        vec![
            vec![(0, 1.0), (1, 1.0), (2, 1.0)],
            vec![(0, 1.0), (1, 1.0), (3, 1.0)],
            vec![(4, 1.0), (5, 1.0), (6, 1.0)],
            vec![],
        ]
    }

    #[test]
    fn test_digamma_known_values() {
        assert!((digamma(1.0) + 0.577_215_664_9).abs() < 1e-9);
        assert!((digamma(0.5) + 1.963_510_026_0).abs() < 1e-9);
        assert!((digamma(10.0) - 2.251_752_589_1).abs() < 1e-9);
    }

    #[test]
    fn test_distributions_sum_to_one() {
        let model = fit(&corpus(), 7, &LdaParams::new(3).passes(5)).unwrap();
        for doc in 0..model.num_documents() {
            let total: f64 = model.document_topics(doc).iter().sum();
            assert!((total - 1.0).abs() < 1e-9, "document {doc} sums to {total}");
        }
        for topic in 0..model.num_topics() {
            let total: f64 = model.topic_terms(topic, 7).iter().map(|(_, p)| p).sum();
            assert!((total - 1.0).abs() < 1e-9, "topic {topic} sums to {total}");
        }
    }

    #[test]
    fn test_same_seed_same_model() {
        let params = LdaParams::new(2).seed(42).passes(3);
        let a = fit(&corpus(), 7, &params).unwrap();
        let b = fit(&corpus(), 7, &params).unwrap();
        assert_eq!(a.topic_terms(0, 7), b.topic_terms(0, 7));
        assert_eq!(a.document_topics(1), b.document_topics(1));
    }

    #[test]
    fn test_empty_document_gets_uniform_topics() {
        let model = fit(&corpus(), 7, &LdaParams::new(4)).unwrap();
        for p in model.document_topics(3) {
            assert!((p - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_eta_is_floored() {
        let model = fit(&corpus(), 7, &LdaParams::new(2).eta(0.0)).unwrap();
        assert!(model.topic_terms(0, 7).iter().all(|(_, p)| p.is_finite()));
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(
            fit(&corpus(), 7, &LdaParams::new(0)).unwrap_err(),
            LdaError::InvalidTopicCount
        );
        assert_eq!(fit(&[], 7, &LdaParams::new(2)).unwrap_err(), LdaError::EmptyCorpus);
        assert_eq!(
            fit(&[vec![]], 7, &LdaParams::new(2)).unwrap_err(),
            LdaError::EmptyCorpus
        );
        assert!(matches!(
            fit(&corpus(), 3, &LdaParams::new(2)),
            Err(LdaError::InvalidParameter(_))
        ));
        assert!(matches!(
            fit(&corpus(), 7, &LdaParams::new(2).alpha(f64::NAN)),
            Err(LdaError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_topic_terms_sorted_desc() {
        let model = fit(&corpus(), 7, &LdaParams::new(2).passes(10)).unwrap();
        let terms = model.topic_terms(0, 7);
        assert!(terms.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn test_from_weights_normalises() {
        let topic_term = ndarray::array![[2.0, 2.0], [0.0, 0.0]];
        let doc_topic = ndarray::array![[3.0, 1.0]];
        let model = TrainedModel::from_weights(topic_term, doc_topic, LdaParams::new(2));
        assert_eq!(model.topic_terms(1, 2), vec![(0, 0.5), (1, 0.5)]);
        assert_eq!(model.document_topics(0), vec![0.75, 0.25]);
        assert_eq!(model.dominant_topic(0), 0);
    }
}
