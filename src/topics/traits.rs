// Topic modeler trait: the seam between calibration and the fitting
// algorithm.
//
// The calibrator only needs "fit a model with these parameters". Tests plug
// in recording or canned modelers; production uses variational LDA.

use super::lda::{LdaError, LdaParams, TrainedModel};
use crate::corpus::TrainingCorpus;

/// Fits a topic model over a training corpus.
pub trait TopicModeler {
    fn fit(&self, corpus: &TrainingCorpus, params: &LdaParams) -> Result<TrainedModel, LdaError>;
}
