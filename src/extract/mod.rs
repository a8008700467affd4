// Text extraction: from raw pages to a normalized lemma string.

pub mod landmarks;
pub mod lemma;
pub mod normalize;
pub mod sanitize;
pub mod stopwords;

use crate::error::PipelineError;
use lemma::Lemmatizer;
use stopwords::Stopwords;

/// Run one document through boundary detection, sanitizing and
/// normalization.
///
/// Fails with `MalformedInput` when the document has no pages, nothing
/// survives line cleanup, or normalization leaves no tokens.
pub fn clean_document(
    name: &str,
    pages: &[String],
    stopwords: &Stopwords,
    lemmatizer: &Lemmatizer,
) -> Result<String, PipelineError> {
    if pages.is_empty() {
        return Err(PipelineError::malformed(name, "no extractable pages"));
    }

    let lines = landmarks::extract_main_text(pages);
    let lines = sanitize::remove_unwanted_lines(&lines);
    if lines.is_empty() {
        return Err(PipelineError::malformed(name, "no lines survived sanitizing"));
    }

    let blob = sanitize::strip_inside_lines(&lines);
    let normalized = normalize::normalize_text(&blob, stopwords, lemmatizer);
    if normalized.is_empty() {
        return Err(PipelineError::malformed(name, "no tokens survived normalization"));
    }
    Ok(normalized)
}
