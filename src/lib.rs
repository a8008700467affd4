// Sediment: text cleaning and calibrated topic modelling for a collection
// of extracted research papers.
//
// This is the library root. Each module corresponds to one stage of the
// pipeline or to the plumbing around it.

pub mod config;
pub mod corpus;
pub mod db;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod status;
pub mod topics;
