use monnaie_core::{EnrichedTable, RawTable};
use std::path::Path;
use thiserror::Error;

use crate::catalog::{Catalog, FormatKind};
use crate::classify::enrich;
use crate::normalize::normalize;
use crate::reader::{read_table, ReadError};

#[derive(Error, Debug)]
pub enum StandardizeError {
    #[error("Failed to read file: {0}")]
    Read(#[from] ReadError),
    #[error("Unrecognized structure (columns: {})", header.join(", "))]
    UnrecognizedStructure { header: Vec<String> },
}

/// A raw export turned into the common schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Standardized {
    pub format: String,
    pub kind: FormatKind,
    pub table: EnrichedTable,
}

/// Detect, normalize and classify against one catalog.
#[derive(Debug, Clone)]
pub struct Standardizer {
    catalog: Catalog,
}

impl Standardizer {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn standardize(&self, raw: &RawTable) -> Result<Standardized, StandardizeError> {
        let descriptor = self.catalog.detect(&raw.header).ok_or_else(|| {
            StandardizeError::UnrecognizedStructure {
                header: raw.header.clone(),
            }
        })?;

        let table = enrich(normalize(raw, descriptor), descriptor);
        tracing::info!(format = %descriptor.name, rows = table.len(), "standardized");

        Ok(Standardized {
            format: descriptor.name.clone(),
            kind: descriptor.kind,
            table,
        })
    }

    pub fn standardize_file(&self, path: &Path) -> Result<Standardized, StandardizeError> {
        let raw = read_table(path)?;
        tracing::debug!(path = %path.display(), rows = raw.len(), "read export");
        self.standardize(&raw)
    }
}
