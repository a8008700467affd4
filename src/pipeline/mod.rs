// Batch drivers that chain the library stages together.

pub mod model;
pub mod preprocess;
