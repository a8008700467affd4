// Topic modelling: LDA fitting, calibration and evaluation.

pub mod calibrate;
pub mod coherence;
pub mod evaluate;
pub mod lda;
pub mod overlap;
pub mod traits;
