pub mod catalog;
pub mod classify;
pub mod detect;
pub mod normalize;
pub mod reader;
pub mod standardize;
pub(crate) mod util;

pub use catalog::{
    Catalog, ClassificationRules, ConfigError, FieldMapping, FormatDescriptor, FormatKind,
    KeywordLists, LabelRule, PatternDocument,
};
pub use classify::{classify, enrich, Classifier, Side, Strategy};
pub use detect::detect;
pub use normalize::normalize;
pub use reader::{read_csv, read_table, read_workbook, ReadError};
pub use standardize::{StandardizeError, Standardized, Standardizer};
