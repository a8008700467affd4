// Pipeline error kinds.
//
// Library stages return these typed errors so callers can tell a bad
// document (skip it, keep the batch going) from a bad run (abort). The CLI
// layer wraps them in anyhow like everything else.

use thiserror::Error;

use crate::topics::lda::LdaError;

/// Errors raised by the cleaning, corpus and modelling stages.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A single document could not be cleaned. Recoverable at batch level.
    #[error("malformed input in {document}: {reason}")]
    MalformedInput { document: String, reason: String },

    /// A run option is outside its allowed range.
    #[error("invalid run configuration: {0}")]
    Configuration(String),

    /// The selected corpus cannot support modelling (no documents, or a
    /// document with no surviving terms).
    #[error("degenerate corpus: {0}")]
    DegenerateCorpus(String),

    /// A calibration series has zero variance or non-finite values.
    #[error("numeric degeneracy: {0}")]
    NumericDegeneracy(String),
}

/// Fit failures are either a bad parameter or a corpus with nothing to fit.
impl From<LdaError> for PipelineError {
    fn from(err: LdaError) -> Self {
        match err {
            LdaError::EmptyCorpus => PipelineError::DegenerateCorpus(err.to_string()),
            LdaError::InvalidTopicCount | LdaError::InvalidParameter(_) => {
                PipelineError::Configuration(err.to_string())
            }
        }
    }
}

impl PipelineError {
    pub fn malformed(document: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::MalformedInput {
            document: document.into(),
            reason: reason.into(),
        }
    }

    /// Whether the batch driver may log this error and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PipelineError::MalformedInput { .. })
    }
}
