pub mod dataset;

pub use dataset::{DatasetStore, StoreError, STANDARDIZED_SUFFIX};
