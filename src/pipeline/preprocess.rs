// Batch preprocessing: raw pages to cleaned text for every stored document.
//
// One bad document never stops the batch. It is logged, counted and left
// without new cleaned text.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::models::DocumentRecord;
use crate::db::queries;
use crate::error::PipelineError;
use crate::extract::clean_document;
use crate::extract::lemma::Lemmatizer;
use crate::extract::stopwords::Stopwords;
use crate::source::PageSource;

/// Outcome of one preprocessing batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreprocessSummary {
    pub processed: usize,
    pub failed: usize,
    /// Filenames that could not be cleaned, with the reason.
    pub failures: Vec<(String, String)>,
}

impl PreprocessSummary {
    pub fn total(&self) -> usize {
        self.processed + self.failed
    }
}

/// Clean every document (or only never-cleaned ones with `new_only`) and
/// store the results, in natural filename order.
pub fn run(
    conn: &Connection,
    source: &dyn PageSource,
    stopwords: &Stopwords,
    lemmatizer: &Lemmatizer,
    new_only: bool,
) -> Result<PreprocessSummary> {
    let documents = queries::documents_to_process(conn, new_only)?;
    info!(documents = documents.len(), new_only, "Preprocessing documents");

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Cleaning [{bar:30}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut summary = PreprocessSummary::default();
    for doc in &documents {
        match clean_one(source, doc, stopwords, lemmatizer) {
            Ok(text) => {
                queries::save_cleaned_text(conn, doc.id, &text)?;
                summary.processed += 1;
            }
            Err(e) if e.is_recoverable() => {
                warn!(document = %doc.filename, error = %e, "Skipping document");
                summary.failed += 1;
                summary.failures.push((doc.filename.clone(), e.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!(
        processed = summary.processed,
        failed = summary.failed,
        "Preprocessing complete"
    );
    Ok(summary)
}

fn clean_one(
    source: &dyn PageSource,
    doc: &DocumentRecord,
    stopwords: &Stopwords,
    lemmatizer: &Lemmatizer,
) -> Result<String, PipelineError> {
    let pages = match source.pages(&doc.filename) {
        Ok(Some(pages)) => pages,
        Ok(None) => {
            return Err(PipelineError::malformed(
                &doc.filename,
                "no page text found",
            ))
        }
        Err(e) => return Err(PipelineError::malformed(&doc.filename, format!("{e:#}"))),
    };
    clean_document(&doc.filename, &pages, stopwords, lemmatizer)
}
