// Unit tests for topic modelling: the LDA fit, u_mass coherence, the
// calibration sweeps and evaluation helpers.
//
// Calibration tests wrap the real modeler in a recorder so they can check
// exactly which fits each sweep asks for.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashSet};

use ndarray::Array2;

use sediment::corpus::TrainingCorpus;
use sediment::error::PipelineError;
use sediment::topics::calibrate::{CalibratedParameters, Calibrator, TOPIC_COUNTS};
use sediment::topics::coherence::{topic_coherence, DocumentIndex};
use sediment::topics::evaluate::{pair_weights, rescale, truncate_probability};
use sediment::topics::lda::{default_alpha, LdaError, LdaParams, TrainedModel, VariationalLda, DEFAULT_ETA};
use sediment::topics::overlap::mean_pairwise_jaccard;
use sediment::topics::traits::TopicModeler;

fn corpus(docs: &[&[&str]], tfidf: bool) -> TrainingCorpus {
    let documents: Vec<BTreeSet<String>> = docs
        .iter()
        .map(|terms| terms.iter().map(|t| t.to_string()).collect())
        .collect();
    TrainingCorpus::new(documents, tfidf)
}

fn small_corpus() -> TrainingCorpus {
    corpus(
        &[
            &["delta", "levee", "scour"],
            &["delta", "levee", "crest"],
            &["gravel", "bar", "riffle"],
        ],
        false,
    )
}

/// Records every parameter set it is asked to fit.
struct RecordingModeler {
    calls: RefCell<Vec<LdaParams>>,
}

impl RecordingModeler {
    fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<LdaParams> {
        self.calls.borrow().clone()
    }
}

impl TopicModeler for RecordingModeler {
    fn fit(&self, corpus: &TrainingCorpus, params: &LdaParams) -> Result<TrainedModel, LdaError> {
        self.calls.borrow_mut().push(params.clone());
        VariationalLda.fit(corpus, params)
    }
}

/// Accept a finished sweep, or one whose scores were too flat to normalise.
fn assert_ran_or_flat<T>(result: Result<T, PipelineError>) {
    match result {
        Ok(_) | Err(PipelineError::NumericDegeneracy(_)) => {}
        Err(other) => panic!("sweep should finish or report flat scores, got {other:?}"),
    }
}

/// Twenty documents with nested term sets: `s{m}` and `t{m}` occur in
/// documents 0..=m, so lower-numbered terms are rarer and always co-occur
/// with the higher-numbered ones.
fn nested_corpus() -> TrainingCorpus {
    let documents: Vec<BTreeSet<String>> = (0..20)
        .map(|d| {
            (d..20)
                .flat_map(|m| [format!("s{m:02}"), format!("t{m:02}")])
                .collect()
        })
        .collect();
    TrainingCorpus::new(documents, false)
}

/// Returns fixed topics per topic count instead of fitting. Counts 1 to 4
/// rank the `s` terms and counts 5 to 7 the `t` terms, so only the 4 and 5
/// runs share no top terms. Count 4 lists rare terms first, which gives it
/// the best u_mass score.
struct ScriptedModeler;

impl TopicModeler for ScriptedModeler {
    fn fit(&self, corpus: &TrainingCorpus, params: &LdaParams) -> Result<TrainedModel, LdaError> {
        let k = params.num_topics;
        let (prefix, rare_first) = match k {
            1..=3 => ("s", false),
            4 => ("s", true),
            _ => ("t", false),
        };
        let mut ranked: Vec<String> = (0..20).map(|m| format!("{prefix}{m:02}")).collect();
        if !rare_first {
            ranked.reverse();
        }

        let mut topic_term = Array2::zeros((k, corpus.dictionary.len()));
        for topic in 0..k {
            for (rank, term) in ranked.iter().enumerate() {
                let id = corpus.dictionary.id(term).ok_or(LdaError::EmptyCorpus)?;
                topic_term[[topic, id]] = (100 - rank) as f64;
            }
        }
        let doc_topic = Array2::from_elem((corpus.len(), k), 1.0);
        Ok(TrainedModel::from_weights(topic_term, doc_topic, params.clone()))
    }
}

// ============================================================
// LDA fit
// ============================================================

#[test]
fn fit_is_reproducible_and_normalised() {
    let corpus = small_corpus();
    let params = LdaParams::new(2).seed(11).passes(5);
    let a = VariationalLda.fit(&corpus, &params).unwrap();
    let b = VariationalLda.fit(&corpus, &params).unwrap();
    for doc in 0..corpus.len() {
        assert_eq!(a.document_topics(doc), b.document_topics(doc), "same seed, same fit");
        let total: f64 = a.document_topics(doc).iter().sum();
        assert!((total - 1.0).abs() < 1e-6, "doc {doc} sums to {total}");
    }
    for topic in 0..2 {
        let total: f64 = (0..a.vocabulary_size())
            .map(|term| a.term_probability(topic, term))
            .sum();
        assert!((total - 1.0).abs() < 1e-6);
    }
}

#[test]
fn fit_rejects_zero_topics() {
    let err = VariationalLda
        .fit(&small_corpus(), &LdaParams::new(0))
        .unwrap_err();
    assert_eq!(err, LdaError::InvalidTopicCount);
}

#[test]
fn default_alpha_is_fifty_over_k() {
    assert_eq!(default_alpha(5), 10.0);
    assert_eq!(LdaParams::new(4).alpha, 12.5);
    assert_eq!(LdaParams::new(4).eta, DEFAULT_ETA);
}

// ============================================================
// Coherence and overlap
// ============================================================

#[test]
fn coherence_uses_term_sets_even_under_tfidf() {
    // delta appears everywhere, so TF-IDF drops it from the vectors
    let weighted = corpus(&[&["delta", "levee"], &["delta", "scour"]], true);
    let index = DocumentIndex::for_corpus(&weighted);
    let delta = weighted.dictionary.id("delta").unwrap();
    let levee = weighted.dictionary.id("levee").unwrap();
    assert_eq!(index.document_frequency(delta), 2);
    // ln((1/2) / (2/2))
    let score = topic_coherence(&[delta, levee], &index);
    assert!((score - 0.5f64.ln()).abs() < 1e-9, "got {score}");
}

#[test]
fn identical_runs_have_full_overlap() {
    let run = vec![vec!["delta", "levee"], vec!["gravel", "bar"]];
    let same = mean_pairwise_jaccard(&run, &run);
    // each topic matches itself fully and the other not at all
    assert!((same - 0.5).abs() < 1e-12);
}

// ============================================================
// Calibration sweeps
// ============================================================

#[test]
fn calibrator_rejects_empty_corpus() {
    let empty = corpus(&[], false);
    let result = Calibrator::new(&VariationalLda, &empty, 1, 1);
    assert!(matches!(result, Err(PipelineError::DegenerateCorpus(_))));
}

#[test]
fn topic_count_sweep_fits_every_count_with_fixed_seed() {
    let corpus = small_corpus();
    let modeler = RecordingModeler::new();
    let calibrator = Calibrator::new(&modeler, &corpus, 2, 9).unwrap();
    // the selection itself may be degenerate on a corpus this small
    assert_ran_or_flat(calibrator.calibrate_topic_count());

    let calls = modeler.calls();
    let counts: Vec<usize> = calls.iter().map(|p| p.num_topics).collect();
    assert_eq!(counts, TOPIC_COUNTS.to_vec());
    assert!(calls.iter().all(|p| p.seed == 0 && p.passes == 2));
    assert!(calls.iter().all(|p| p.alpha == default_alpha(p.num_topics)));
}

#[test]
fn topic_count_with_no_overlap_to_the_next_run_is_chosen() {
    let corpus = nested_corpus();
    let calibrator = Calibrator::new(&ScriptedModeler, &corpus, 1, 1).unwrap();
    let (k, series) = calibrator.calibrate_topic_count().unwrap();
    assert_eq!(k, 4, "the 4-topic run shares nothing with the 5-topic run");

    assert_eq!(series.values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], "7 has no successor to score against");
    assert_eq!(series.selected, 4.0);
    let stability = series.normalized_stability.expect("count sweep scores stability");
    assert_eq!(stability.len(), 6);
    assert!(stability[..3].iter().all(|&z| (z - stability[4]).abs() < 1e-9));
    assert!(stability[3] < stability[2], "4 vs 5 overlaps least");
    assert!(series.coherence[3] > series.coherence[2]);
    assert!((series.coherence[2] - series.coherence[4]).abs() < 1e-9, "s and t runs score alike");
}

#[test]
fn invalid_sweep_parameters_are_a_configuration_error() {
    let corpus = small_corpus();
    let calibrator = Calibrator::new(&VariationalLda, &corpus, 0, 1).unwrap();
    assert!(matches!(
        calibrator.calibrate_topic_count(),
        Err(PipelineError::Configuration(_))
    ));
}

#[test]
fn seed_sweep_covers_the_token_range() {
    let corpus = small_corpus();
    let modeler = RecordingModeler::new();
    let calibrator = Calibrator::new(&modeler, &corpus, 1, 9).unwrap();
    let (seed, series) = calibrator.calibrate_seed(2).unwrap();

    let seeds: Vec<u64> = modeler.calls().iter().map(|p| p.seed).collect();
    assert_eq!(seeds, (0..9).collect::<Vec<u64>>(), "9 tokens give seeds 0 through 8");
    assert!(seeds.contains(&seed));
    assert_eq!(series.values.len(), 9);
    assert_eq!(series.normalized_coherence.len(), 9);
    assert_eq!(series.selected, seed as f64);
}

#[test]
fn prior_sweeps_hold_the_other_prior_at_default() {
    let corpus = small_corpus();

    let modeler = RecordingModeler::new();
    let calibrator = Calibrator::new(&modeler, &corpus, 1, 9).unwrap();
    assert_ran_or_flat(calibrator.calibrate_alpha(2, 5));
    let calls = modeler.calls();
    assert_eq!(calls.len(), 50);
    assert!(calls.iter().all(|p| p.seed == 5 && p.eta == DEFAULT_ETA));
    assert_eq!(calls[0].alpha, 1.0);
    assert_eq!(calls[49].alpha, 50.0);

    let modeler = RecordingModeler::new();
    let calibrator = Calibrator::new(&modeler, &corpus, 1, 9).unwrap();
    assert_ran_or_flat(calibrator.calibrate_eta(2, 5));
    let calls = modeler.calls();
    assert_eq!(calls.len(), 51);
    assert!(calls.iter().all(|p| p.alpha == default_alpha(2)));
    assert_eq!(calls[0].eta, 0.0, "zero eta is passed through and floored inside the fit");
}

#[test]
fn final_fit_uses_final_passes_and_chosen_parameters() {
    let corpus = small_corpus();
    let modeler = RecordingModeler::new();
    let calibrator = Calibrator::new(&modeler, &corpus, 1, 9).unwrap();
    let chosen = CalibratedParameters {
        num_topics: 2,
        seed: 4,
        seed_percent: 4.0 / 9.0 * 100.0,
        alpha: 3.0,
        eta: 0.2,
    };
    let (model, coherence) = calibrator.final_fit(&chosen).unwrap();
    assert_eq!(model.num_topics(), 2);
    assert!(coherence.is_finite());

    let calls = modeler.calls();
    assert_eq!(calls.len(), 1);
    let params = &calls[0];
    assert_eq!((params.seed, params.passes), (4, 9));
    assert_eq!((params.alpha, params.eta), (3.0, 0.2));
}

// ============================================================
// Evaluation helpers
// ============================================================

#[test]
fn rescale_maps_extremes_to_bounds() {
    let scaled = rescale(&[2.0, 4.0, 6.0], 15.0, 50.0);
    assert_eq!(scaled[0], 15.0);
    assert_eq!(scaled[2], 50.0);
    assert!((scaled[1] - 32.5).abs() < 1e-9);
}

#[test]
fn zero_pair_counts_get_zero_weight() {
    let weights = pair_weights(&[0, 3, 6]);
    assert_eq!(weights[0], 0.0);
    assert_eq!(weights[2], 1.0);
}

#[test]
fn probabilities_are_truncated_not_rounded() {
    assert_eq!(truncate_probability(0.4999), "0.499");
    let distinct: HashSet<String> = [0.1234, 0.1239].iter().map(|&p| truncate_probability(p)).collect();
    assert_eq!(distinct.len(), 1);
}
