// Calibration of LDA hyperparameters.
//
// Strictly sequential sweeps, each fixing one parameter for the next:
//
//   1. Topic count: fit k = 1..7 at seed 0 and default priors. Score each
//      k by coherence and by stability (mean Jaccard overlap of its top
//      terms with the k+1 run). Both series are z-scored and the k with
//      the largest (coherence - stability) wins. High overlap with the
//      next run means the extra topic only duplicated existing ones.
//   2. Seed: about 100 seeds spread over [0, total tokens), best raw
//      coherence wins.
//   3. Alpha and eta, each only when not left at its default: sweep the
//      candidate list with the other prior at its default, pick the
//      largest z-scored coherence.
//   4. Final fit with many more passes.
//
// Ties always go to the first candidate. Any series whose z-scores are
// undefined (zero variance, non-finite values) is an error, never a NaN
// comparison.

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::info;

use super::coherence::{self, DocumentIndex, COHERENCE_TOP_N};
use super::lda::{default_alpha, LdaParams, TrainedModel, DEFAULT_ETA};
use super::overlap::mean_pairwise_jaccard;
use super::traits::TopicModeler;
use crate::config::RunConfig;
use crate::corpus::TrainingCorpus;
use crate::error::PipelineError;

/// Topic counts tried during count calibration.
pub const TOPIC_COUNTS: [usize; 7] = [1, 2, 3, 4, 5, 6, 7];

/// Target number of seeds in the seed sweep.
pub const SEED_SWEEP_POINTS: usize = 100;

/// Seed used while the topic count is still being calibrated.
pub const COUNT_CALIBRATION_SEED: u64 = 0;

/// Alpha candidates: the integers 1 through 50.
pub fn alpha_candidates() -> Vec<f64> {
    (1..=50).map(f64::from).collect()
}

/// Eta candidates: 0.00 through 1.00 in steps of 0.02.
pub fn eta_candidates() -> Vec<f64> {
    (0..=50).map(|i| f64::from(i) * 0.02).collect()
}

/// Evenly spaced seeds over `[0, total_tokens)`, about
/// `SEED_SWEEP_POINTS` of them.
pub fn seed_candidates(total_tokens: usize) -> Vec<u64> {
    let step = (total_tokens / SEED_SWEEP_POINTS).max(1);
    (0..total_tokens).step_by(step).map(|s| s as u64).collect()
}

/// Standardise to zero mean and unit (population) variance. `None` when
/// the series is empty, non-finite or constant.
pub fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std = variance.sqrt();
    if std <= f64::EPSILON * mean.abs().max(1.0) {
        return None;
    }
    Some(values.iter().map(|v| (v - mean) / std).collect())
}

/// `standardize`, failing with the matching pipeline error.
pub fn z_scores(values: &[f64], what: &str) -> Result<Vec<f64>, PipelineError> {
    if values.is_empty() {
        return Err(PipelineError::DegenerateCorpus(format!(
            "the {what} series is empty"
        )));
    }
    standardize(values).ok_or_else(|| {
        PipelineError::NumericDegeneracy(format!(
            "the {what} series has zero variance or non-finite values: {values:?}"
        ))
    })
}

/// Index of the largest value; the first one wins ties.
pub fn argmax_first(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &value) in values.iter().enumerate() {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

/// One sweep's candidates and scores, kept for the calibration charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationSeries {
    pub parameter: String,
    pub values: Vec<f64>,
    pub coherence: Vec<f64>,
    pub normalized_coherence: Vec<f64>,
    /// Only the topic-count sweep scores stability.
    pub normalized_stability: Option<Vec<f64>>,
    pub selected: f64,
}

/// The hyperparameters the final model is trained with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibratedParameters {
    pub num_topics: usize,
    pub seed: u64,
    /// The seed as a percentage of the corpus token count.
    pub seed_percent: f64,
    pub alpha: f64,
    pub eta: f64,
}

/// Everything calibration produces.
#[derive(Debug, Clone)]
pub struct CalibrationOutcome {
    pub parameters: CalibratedParameters,
    pub series: Vec<CalibrationSeries>,
    pub model: TrainedModel,
    pub final_coherence: f64,
}

/// Pick the topic count with the largest normalized (coherence - stability).
///
/// `coherence[i]` and `stability[i]` both describe `counts[i]`.
pub fn select_topic_count(
    counts: &[usize],
    coherence: &[f64],
    stability: &[f64],
) -> Result<(usize, CalibrationSeries), PipelineError> {
    if counts.len() != coherence.len() || counts.len() != stability.len() {
        return Err(PipelineError::NumericDegeneracy(format!(
            "topic-count series lengths differ: {} counts, {} coherence, {} stability",
            counts.len(),
            coherence.len(),
            stability.len()
        )));
    }
    let zc = z_scores(coherence, "topic-count coherence")?;
    let zs = z_scores(stability, "topic-count stability")?;
    let combined: Vec<f64> = zc.iter().zip(&zs).map(|(c, s)| c - s).collect();
    let best = argmax_first(&combined).ok_or_else(|| {
        PipelineError::DegenerateCorpus("no topic count to choose from".to_string())
    })?;

    let series = CalibrationSeries {
        parameter: "topic count".to_string(),
        values: counts.iter().map(|&k| k as f64).collect(),
        coherence: coherence.to_vec(),
        normalized_coherence: zc,
        normalized_stability: Some(zs),
        selected: counts[best] as f64,
    };
    Ok((counts[best], series))
}

/// Pick the candidate with the largest z-scored coherence.
pub fn select_by_coherence(
    parameter: &str,
    values: &[f64],
    coherence: &[f64],
) -> Result<(f64, CalibrationSeries), PipelineError> {
    let normalized = z_scores(coherence, &format!("{parameter} coherence"))?;
    let best = argmax_first(&normalized).ok_or_else(|| {
        PipelineError::DegenerateCorpus(format!("no {parameter} candidates"))
    })?;
    let selected = values[best];
    let series = CalibrationSeries {
        parameter: parameter.to_string(),
        values: values.to_vec(),
        coherence: coherence.to_vec(),
        normalized_coherence: normalized,
        normalized_stability: None,
        selected,
    };
    Ok((selected, series))
}

fn progress_bar(label: &str, len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!("  {label} [{{bar:30}}] {{pos}}/{{len}} ({{eta}})"))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

/// Runs the calibration sweeps over one corpus.
pub struct Calibrator<'a, M: TopicModeler> {
    modeler: &'a M,
    corpus: &'a TrainingCorpus,
    index: DocumentIndex,
    calibration_passes: usize,
    final_passes: usize,
}

impl<'a, M: TopicModeler> Calibrator<'a, M> {
    pub fn new(
        modeler: &'a M,
        corpus: &'a TrainingCorpus,
        calibration_passes: usize,
        final_passes: usize,
    ) -> Result<Self, PipelineError> {
        if corpus.is_empty() || corpus.dictionary.is_empty() {
            return Err(PipelineError::DegenerateCorpus(
                "cannot calibrate on an empty corpus".to_string(),
            ));
        }
        Ok(Self {
            modeler,
            corpus,
            index: DocumentIndex::for_corpus(corpus),
            calibration_passes,
            final_passes,
        })
    }

    pub fn index(&self) -> &DocumentIndex {
        &self.index
    }

    fn fit(&self, params: &LdaParams) -> Result<TrainedModel, PipelineError> {
        Ok(self.modeler.fit(self.corpus, params)?)
    }

    fn sweep_params(&self, num_topics: usize) -> LdaParams {
        LdaParams::new(num_topics).passes(self.calibration_passes)
    }

    /// Sweep `TOPIC_COUNTS` and pick the most coherent, least redundant.
    pub fn calibrate_topic_count(&self) -> Result<(usize, CalibrationSeries), PipelineError> {
        let pb = progress_bar("Topics", TOPIC_COUNTS.len());
        let mut top_terms: Vec<Vec<Vec<usize>>> = Vec::with_capacity(TOPIC_COUNTS.len());
        let mut coherence_scores = Vec::with_capacity(TOPIC_COUNTS.len());
        for &k in &TOPIC_COUNTS {
            let model = self.fit(&self.sweep_params(k).seed(COUNT_CALIBRATION_SEED))?;
            top_terms.push(coherence::ranked_topic_terms(&model, COHERENCE_TOP_N));
            coherence_scores.push(coherence::model_coherence(&model, &self.index));
            pb.inc(1);
        }
        pb.finish_and_clear();

        // the last count has no successor to compare against
        let scored = TOPIC_COUNTS.len() - 1;
        let stability: Vec<f64> = top_terms
            .windows(2)
            .map(|pair| mean_pairwise_jaccard(&pair[0], &pair[1]))
            .collect();

        let (k, series) = select_topic_count(
            &TOPIC_COUNTS[..scored],
            &coherence_scores[..scored],
            &stability,
        )?;
        info!(topics = k, "Topic count calibrated");
        Ok((k, series))
    }

    /// Sweep seeds at `num_topics` and default priors; best raw coherence.
    pub fn calibrate_seed(&self, num_topics: usize) -> Result<(u64, CalibrationSeries), PipelineError> {
        let seeds = seed_candidates(self.corpus.total_tokens());
        if seeds.is_empty() {
            return Err(PipelineError::DegenerateCorpus(
                "the corpus has no tokens to derive seeds from".to_string(),
            ));
        }

        let pb = progress_bar("Seeds", seeds.len());
        let mut scores = Vec::with_capacity(seeds.len());
        for &seed in &seeds {
            let model = self.fit(&self.sweep_params(num_topics).seed(seed))?;
            scores.push(coherence::model_coherence(&model, &self.index));
            pb.inc(1);
        }
        pb.finish_and_clear();

        let best = argmax_first(&scores).ok_or_else(|| {
            PipelineError::DegenerateCorpus("no seed candidates".to_string())
        })?;
        let values: Vec<f64> = seeds.iter().map(|&s| s as f64).collect();
        let series = CalibrationSeries {
            parameter: "seed".to_string(),
            normalized_coherence: standardize(&scores).unwrap_or_else(|| vec![0.0; scores.len()]),
            values,
            coherence: scores,
            normalized_stability: None,
            selected: seeds[best] as f64,
        };
        info!(seed = seeds[best], "Seed calibrated");
        Ok((seeds[best], series))
    }

    /// Sweep `alpha_candidates` with eta at its default.
    pub fn calibrate_alpha(
        &self,
        num_topics: usize,
        seed: u64,
    ) -> Result<(f64, CalibrationSeries), PipelineError> {
        let candidates = alpha_candidates();
        let scores = self.prior_sweep("Alpha", &candidates, |alpha| {
            self.sweep_params(num_topics).seed(seed).alpha(alpha)
        })?;
        let (alpha, series) = select_by_coherence("alpha", &candidates, &scores)?;
        info!(alpha, "Alpha calibrated");
        Ok((alpha, series))
    }

    /// Sweep `eta_candidates` with alpha at its default.
    pub fn calibrate_eta(
        &self,
        num_topics: usize,
        seed: u64,
    ) -> Result<(f64, CalibrationSeries), PipelineError> {
        let candidates = eta_candidates();
        let scores = self.prior_sweep("Eta", &candidates, |eta| {
            self.sweep_params(num_topics).seed(seed).eta(eta)
        })?;
        let (eta, series) = select_by_coherence("eta", &candidates, &scores)?;
        info!(eta, "Eta calibrated");
        Ok((eta, series))
    }

    fn prior_sweep(
        &self,
        label: &str,
        candidates: &[f64],
        params_for: impl Fn(f64) -> LdaParams,
    ) -> Result<Vec<f64>, PipelineError> {
        let pb = progress_bar(label, candidates.len());
        let mut scores = Vec::with_capacity(candidates.len());
        for &value in candidates {
            let model = self.fit(&params_for(value))?;
            scores.push(coherence::model_coherence(&model, &self.index));
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(scores)
    }

    /// Train with the final parameters and report its coherence.
    pub fn final_fit(
        &self,
        parameters: &CalibratedParameters,
    ) -> Result<(TrainedModel, f64), PipelineError> {
        let params = LdaParams::new(parameters.num_topics)
            .seed(parameters.seed)
            .alpha(parameters.alpha)
            .eta(parameters.eta)
            .passes(self.final_passes);
        let model = self.fit(&params)?;
        let score = coherence::model_coherence(&model, &self.index);
        info!(
            topics = parameters.num_topics,
            passes = self.final_passes,
            coherence = score,
            "Final model trained"
        );
        Ok((model, score))
    }

    /// All sweeps in order, then the final fit. Priors left at their
    /// defaults by `run` are not swept.
    pub fn run(&self, run: &RunConfig) -> Result<CalibrationOutcome, PipelineError> {
        let mut series = Vec::new();

        let (num_topics, count_series) = self.calibrate_topic_count()?;
        series.push(count_series);

        let (seed, seed_series) = self.calibrate_seed(num_topics)?;
        series.push(seed_series);

        let alpha = if run.default_alpha {
            default_alpha(num_topics)
        } else {
            let (alpha, alpha_series) = self.calibrate_alpha(num_topics, seed)?;
            series.push(alpha_series);
            alpha
        };

        let eta = if run.default_eta {
            DEFAULT_ETA
        } else {
            let (eta, eta_series) = self.calibrate_eta(num_topics, seed)?;
            series.push(eta_series);
            eta
        };

        let total = self.corpus.total_tokens().max(1) as f64;
        let parameters = CalibratedParameters {
            num_topics,
            seed,
            seed_percent: seed as f64 / total * 100.0,
            alpha,
            eta,
        };
        let (model, final_coherence) = self.final_fit(&parameters)?;

        Ok(CalibrationOutcome {
            parameters,
            series,
            model,
            final_coherence,
        })
    }
}
