// Modelling pipeline: selected documents to a calibrated, evaluated topic
// model, then on to a report sink.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::info;

use crate::config::RunConfig;
use crate::corpus::{build_corpus, TrainingCorpus, COMMON_TERMS, TOP_TERMS};
use crate::db::models::DocumentRecord;
use crate::db::queries;
use crate::error::PipelineError;
use crate::output::ReportSink;
use crate::topics::calibrate::{CalibrationOutcome, Calibrator};
use crate::topics::evaluate::{evaluate, DocumentLabel, Evaluation};
use crate::topics::traits::TopicModeler;

/// Everything one modelling run produced.
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub config: RunConfig,
    pub documents: Vec<DocumentRecord>,
    /// Most frequent terms after suppression, with document counts.
    pub top_terms: Vec<(String, usize)>,
    pub corpus: TrainingCorpus,
    pub calibration: CalibrationOutcome,
    pub evaluation: Evaluation,
    pub finished_at: DateTime<Utc>,
}

/// Select the run's documents from the database and model them.
pub fn run<M: TopicModeler>(
    conn: &Connection,
    config: RunConfig,
    modeler: &M,
    calibration_passes: usize,
    final_passes: usize,
) -> Result<ModelRun> {
    let documents = queries::select_documents(conn, &config.scope)?;
    info!(
        scope = %config.scope,
        documents = documents.len(),
        "Documents selected"
    );
    Ok(fit_documents(
        documents,
        config,
        modeler,
        calibration_passes,
        final_passes,
    )?)
}

/// Build the corpus from already-selected documents, calibrate, train the
/// final model and evaluate it.
pub fn fit_documents<M: TopicModeler>(
    documents: Vec<DocumentRecord>,
    config: RunConfig,
    modeler: &M,
    calibration_passes: usize,
    final_passes: usize,
) -> Result<ModelRun, PipelineError> {
    let texts: Vec<String> = documents
        .iter()
        .map(|doc| doc.cleaned_text.clone().unwrap_or_default())
        .collect();
    let suppression = config.suppress_common.then_some(COMMON_TERMS);
    let build = build_corpus(&texts, config.ngram_order, suppression)?;

    let corpus = TrainingCorpus::new(build.documents, config.tfidf);
    let calibration =
        Calibrator::new(modeler, &corpus, calibration_passes, final_passes)?.run(&config)?;

    let labels: Vec<DocumentLabel> = documents.iter().map(DocumentRecord::label).collect();
    let evaluation = evaluate(
        &calibration.model,
        &corpus,
        &labels,
        &build.top_terms,
        config.scope.label(),
    );

    Ok(ModelRun {
        config,
        documents,
        top_terms: build.top_terms,
        corpus,
        calibration,
        evaluation,
        finished_at: Utc::now(),
    })
}

/// Hand every result of `run` to `sink`: word clouds, word webs, tables and
/// finally the manifest.
pub fn publish(run: &ModelRun, sink: &mut dyn ReportSink) -> Result<()> {
    for cloud in &run.evaluation.clouds {
        sink.word_cloud(cloud)?;
    }
    for graph in &run.evaluation.graphs {
        sink.cooccurrence_graph(graph)?;
    }

    let num_topics = run.calibration.model.num_topics();
    let mut headers = vec!["Title".to_string(), "Citation".to_string()];
    headers.extend((1..=num_topics).map(|t| format!("Topic {t}")));
    headers.extend(["Topic".to_string(), "URL".to_string()]);
    let rows: Vec<Vec<String>> = run
        .evaluation
        .density
        .iter()
        .map(|row| {
            let mut cells = vec![row.title.clone(), row.citation.clone()];
            cells.extend(row.probabilities.iter().cloned());
            cells.push(row.topic.to_string());
            cells.push(row.url.clone());
            cells
        })
        .collect();
    sink.table("Topic Density", &headers, &rows)?;

    let rows: Vec<Vec<String>> = run
        .top_terms
        .iter()
        .map(|(term, count)| vec![term.clone(), count.to_string()])
        .collect();
    sink.table(
        &format!("Top {TOP_TERMS} Terms"),
        &["Term".to_string(), "Documents".to_string()],
        &rows,
    )?;

    for series in &run.calibration.series {
        let mut headers = vec![
            series.parameter.clone(),
            "Coherence".to_string(),
            "Normalized Coherence".to_string(),
        ];
        if series.normalized_stability.is_some() {
            headers.push("Normalized Stability".to_string());
        }
        let rows: Vec<Vec<String>> = (0..series.values.len())
            .map(|i| {
                let mut cells = vec![
                    series.values[i].to_string(),
                    series.coherence[i].to_string(),
                    series.normalized_coherence[i].to_string(),
                ];
                if let Some(stability) = &series.normalized_stability {
                    cells.push(stability[i].to_string());
                }
                cells
            })
            .collect();
        sink.table(&format!("Calibration {}", series.parameter), &headers, &rows)?;
    }

    sink.manifest(&manifest_entries(run))
}

/// Key/value lines describing how a run was configured and what it chose.
pub fn manifest_entries(run: &ModelRun) -> Vec<(String, String)> {
    let config = &run.config;
    let params = &run.calibration.parameters;
    let redone = match (config.reprocessed, config.new_only) {
        (false, _) => "No".to_string(),
        (true, false) => "Yes".to_string(),
        (true, true) => "Yes (new documents only)".to_string(),
    };
    let top_terms = run
        .top_terms
        .iter()
        .map(|(term, _)| term.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        ("Scope".to_string(), config.scope.label().to_string()),
        ("Documents".to_string(), run.documents.len().to_string()),
        ("Preprocessing redone".to_string(), redone),
        ("N-gram size".to_string(), config.ngram_order.to_string()),
        (
            "Common terms suppressed".to_string(),
            yes_no(config.suppress_common),
        ),
        (format!("Top {TOP_TERMS} terms"), top_terms),
        ("TF-IDF".to_string(), yes_no(config.tfidf)),
        ("Default alpha".to_string(), yes_no(config.default_alpha)),
        ("Default eta".to_string(), yes_no(config.default_eta)),
        ("Topic count".to_string(), params.num_topics.to_string()),
        (
            "Seed".to_string(),
            format!("{} ({:.2}% of corpus tokens)", params.seed, params.seed_percent),
        ),
        ("Alpha".to_string(), format!("{:.2}", params.alpha)),
        ("Eta".to_string(), format!("{:.2}", params.eta)),
        (
            "Final coherence".to_string(),
            format!("{:.4}", run.calibration.final_coherence),
        ),
        (
            "Run at".to_string(),
            run.finished_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
    ]
}

fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}
